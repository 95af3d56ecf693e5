use std::io::Write;
use std::time::{Duration, Instant};

use log::debug;
use serde::Deserialize;
use serialport::SerialPort;

use crate::error::{Error, Result};

/// Write timeout for the serial adapter, so a wedged device fails instead of blocking forever
const WRITE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Timing family of the LED driver chips on the strip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum FrequencyClass {
    #[default]
    #[serde(rename = "800kHz")]
    Khz800,
    #[serde(rename = "400kHz")]
    Khz400,
}

impl FrequencyClass {
    /// Adapter clock that turns one pulse byte into one bit period
    pub fn clock_hz(self) -> u32 {
        match self {
            FrequencyClass::Khz800 => 6_000_000,
            FrequencyClass::Khz400 => 3_000_000,
        }
    }
}

/// Byte-oriented link to the strip's data line.
///
/// A frame is always sent as `begin`, one `write`, `end`. Implementations are not
/// expected to be reentrant.
pub trait Transport {
    /// Select the clock for `frequency`. Called once when a strip takes ownership.
    fn configure(&mut self, frequency: FrequencyClass) -> Result<()>;

    fn begin(&mut self) -> Result<()>;

    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    fn end(&mut self) -> Result<()>;

    /// Release the device. Further transactions fail.
    fn close(&mut self) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn configure(&mut self, frequency: FrequencyClass) -> Result<()> {
        (**self).configure(frequency)
    }

    fn begin(&mut self) -> Result<()> {
        (**self).begin()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write(bytes)
    }

    fn end(&mut self) -> Result<()> {
        (**self).end()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// SPI-capable serial adapter reached through a serial device node
pub struct SerialTransport {
    path: String,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Open the adapter at `path` with the clock for `frequency`
    pub fn open(path: &str, frequency: FrequencyClass) -> Result<Self> {
        let port = serialport::new(path, frequency.clock_hz())
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(WRITE_TIMEOUT)
            .open()
            .map_err(|e| Error::transport("open", format!("{}: {}", path, e)))?;

        debug!("Opened {} at {} Hz", path, frequency.clock_hz());

        Ok(SerialTransport {
            path: path.to_string(),
            port: Some(port),
        })
    }

    /// Open the first USB serial adapter found
    pub fn open_default(frequency: FrequencyClass) -> Result<Self> {
        let ports = serialport::available_ports().map_err(|e| Error::transport("open", e))?;
        let port = ports
            .iter()
            .find(|p| matches!(p.port_type, serialport::SerialPortType::UsbPort(_)))
            .ok_or_else(|| Error::transport("open", "no USB serial adapter found"))?;

        debug!("Found adapter {} ({} ports total)", port.port_name, ports.len());
        Self::open(&port.port_name, frequency)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn port(&mut self, operation: &'static str) -> Result<&mut Box<dyn SerialPort>> {
        let path = &self.path;
        self.port
            .as_mut()
            .ok_or_else(|| Error::transport(operation, format!("{} is closed", path)))
    }
}

impl Transport for SerialTransport {
    fn configure(&mut self, frequency: FrequencyClass) -> Result<()> {
        self.port("configure")?
            .set_baud_rate(frequency.clock_hz())
            .map_err(|e| Error::transport("configure", e))
    }

    fn begin(&mut self) -> Result<()> {
        self.port("begin")?
            .clear(serialport::ClearBuffer::Output)
            .map_err(|e| Error::transport("begin", e))
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.port("write")?
            .write_all(bytes)
            .map_err(|e| Error::transport("write", e))
    }

    fn end(&mut self) -> Result<()> {
        self.port("end")?
            .flush()
            .map_err(|e| Error::transport("end", e))
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut port) = self.port.take() {
            port.flush().map_err(|e| Error::transport("close", e))?;
            debug!("Closed {}", self.path);
        }
        Ok(())
    }
}

/// In-memory transport that records every frame written to it
#[derive(Debug, Default)]
pub struct CaptureTransport {
    writes: Vec<(Instant, Vec<u8>)>,
    frequency: Option<FrequencyClass>,
    transactions: usize,
    in_transaction: bool,
    fail_writes: bool,
    fail_next_end: bool,
    closed: bool,
}

impl CaptureTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, like an unplugged adapter
    pub fn fail_writes(&mut self) {
        self.fail_writes = true;
    }

    /// Make the next `end` fail once, after the frame has been written
    pub fn fail_next_end(&mut self) {
        self.fail_next_end = true;
    }

    pub fn last_write(&self) -> Option<&[u8]> {
        self.writes.last().map(|(_, bytes)| bytes.as_slice())
    }

    /// Every write in order, with the instant it arrived
    pub fn writes(&self) -> &[(Instant, Vec<u8>)] {
        &self.writes
    }

    /// Completed begin/end pairs
    pub fn transactions(&self) -> usize {
        self.transactions
    }

    pub fn frequency(&self) -> Option<FrequencyClass> {
        self.frequency
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn check_open(&self, operation: &'static str) -> Result<()> {
        if self.closed {
            return Err(Error::transport(operation, "capture transport is closed"));
        }
        Ok(())
    }
}

impl Transport for CaptureTransport {
    fn configure(&mut self, frequency: FrequencyClass) -> Result<()> {
        self.check_open("configure")?;
        self.frequency = Some(frequency);
        Ok(())
    }

    fn begin(&mut self) -> Result<()> {
        self.check_open("begin")?;
        if self.in_transaction {
            return Err(Error::transport("begin", "transaction already in progress"));
        }
        self.in_transaction = true;
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.check_open("write")?;
        if !self.in_transaction {
            return Err(Error::transport("write", "write outside of a transaction"));
        }
        if self.fail_writes {
            return Err(Error::transport("write", "device disconnected"));
        }
        self.writes.push((Instant::now(), bytes.to_vec()));
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.check_open("end")?;
        if !self.in_transaction {
            return Err(Error::transport("end", "no transaction in progress"));
        }
        self.in_transaction = false;
        if std::mem::take(&mut self.fail_next_end) {
            return Err(Error::transport("end", "flush failed"));
        }
        self.transactions += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.in_transaction = false;
        Ok(())
    }
}
