use std::time::Duration;

use anyhow::{ensure, Context, Result};
use serde::Deserialize;

use neopixel_spi::{Brightness, ChannelOrder, Color, FrequencyClass, Strip, Transport};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Serial device of the SPI adapter. The first USB adapter is used when omitted.
    pub port: Option<String>,
    pub led_count: usize,
    #[serde(default)]
    pub pixel_format: ChannelOrder,
    #[serde(default)]
    pub frequency: FrequencyClass,
    #[serde(default)]
    pub brightness: Brightness,
    /// Applied to every pixel before `pixels`
    pub fill: Option<Color>,
    /// Colors for pixels 0.. in order
    #[serde(default)]
    pub pixels: Vec<Color>,
    /// Keep re-sending the frame at this rate until interrupted
    pub refresh_hz: Option<f64>,
}

impl Config {
    pub fn from_json(data: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.pixels.len() <= self.led_count,
            "{} pixel colors given for {} LEDs",
            self.pixels.len(),
            self.led_count
        );
        self.refresh_period()?;
        Ok(())
    }

    /// Time between refreshes, if refreshing is enabled
    pub fn refresh_period(&self) -> Result<Option<Duration>> {
        let Some(hz) = self.refresh_hz else {
            return Ok(None);
        };
        ensure!(hz > 0.0, "refresh_hz must be positive, got {}", hz);
        let period = Duration::try_from_secs_f64(1.0 / hz)
            .context(format!("refresh_hz {} is too low", hz))?;
        Ok(Some(period))
    }

    /// Load brightness and colors into `strip`
    pub fn apply<T: Transport>(&self, strip: &mut Strip<T>) -> Result<()> {
        strip.set_brightness(self.brightness.value())?;
        if let Some(color) = self.fill {
            strip.fill(color);
        }
        for (index, &color) in self.pixels.iter().enumerate() {
            strip.set_pixel(index, color)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neopixel_spi::CaptureTransport;

    #[test]
    fn test_defaults() {
        let config = Config::from_json(r#"{"led_count": 3}"#).unwrap();
        assert_eq!(config.port, None);
        assert_eq!(config.pixel_format, ChannelOrder::Grb);
        assert_eq!(config.frequency, FrequencyClass::Khz800);
        assert_eq!(config.brightness, Brightness::FULL);
        assert!(config.pixels.is_empty());
        assert!(config.refresh_hz.is_none());
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_json(
            r##"{
                "port": "/dev/ttyUSB0",
                "led_count": 4,
                "pixel_format": "RGB",
                "frequency": "400kHz",
                "brightness": 0.5,
                "fill": "#000010",
                "pixels": ["#FF8000", "0080ff"],
                "refresh_hz": 30
            }"##,
        )
        .unwrap();

        assert_eq!(config.port.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(config.pixel_format, ChannelOrder::Rgb);
        assert_eq!(config.frequency, FrequencyClass::Khz400);
        assert_eq!(config.pixels, vec![Color::new(255, 128, 0), Color::new(0, 128, 255)]);
        assert_eq!(config.refresh_hz, Some(30.0));
        assert_eq!(config.brightness.value(), 0.5);
        assert_eq!(
            config.refresh_period().unwrap(),
            Some(Duration::from_secs_f64(1.0 / 30.0))
        );
    }

    #[test]
    fn test_rejects_invalid() {
        assert!(Config::from_json(r#"{"led_count": 1, "brightness": 2.0}"#).is_err());
        assert!(Config::from_json(r##"{"led_count": 1, "pixels": ["#000000", "#000000"]}"##).is_err());
        assert!(Config::from_json(r##"{"led_count": 1, "pixels": ["#GG0000"]}"##).is_err());
        assert!(Config::from_json(r#"{"led_count": 1, "pixel_format": "BGR"}"#).is_err());
        assert!(Config::from_json(r#"{"led_count": 1, "brightness": -0.1}"#).is_err());
        assert!(Config::from_json(r#"{"led_count": 1, "refresh_hz": 0}"#).is_err());
        assert!(Config::from_json(r#"{"led_count": 1, "refresh_hz": -5}"#).is_err());
    }

    #[test]
    fn test_rejects_refresh_period_overflow() {
        assert!(Config::from_json(r#"{"led_count": 1, "refresh_hz": 1e-320}"#).is_err());
        assert!(Config::from_json(r#"{"led_count": 1, "refresh_hz": 1e-30}"#).is_err());
        assert!(Config::from_json(r#"{"led_count": 1, "refresh_hz": 0.001}"#).is_ok());
    }

    #[test]
    fn test_apply() {
        let config = Config::from_json(
            r##"{"led_count": 3, "fill": "#010203", "pixels": ["#FF0000"], "brightness": 0.5}"##,
        )
        .unwrap();
        let mut strip = Strip::new(
            config.led_count,
            CaptureTransport::new(),
            config.pixel_format,
            config.frequency,
        )
        .unwrap();
        config.apply(&mut strip).unwrap();

        assert_eq!(
            strip.pixels(),
            vec![Color::new(255, 0, 0), Color::new(1, 2, 3), Color::new(1, 2, 3)]
        );
        assert_eq!(strip.brightness(), 0.5);
    }
}
