//! Ownership of a conversion engine

use std::io::{Read, Write};

use tracing::debug;

use crate::config::PumpConfig;
use crate::engine::ConversionEngine;
use crate::iconv::IconvEngine;
use crate::pump::{Pump, Summary};
use crate::{ConversionOption, Error, Result};

/// A stream converter between two encodings
///
/// Owns exactly one engine, released by [`Converter::close`] or on drop,
/// whichever comes first.
#[derive(Debug)]
pub struct Converter<E: ConversionEngine = IconvEngine> {
    engine: Option<E>,
    target: String,
    source: String,
    option: ConversionOption,
    config: PumpConfig,
}

impl Converter<IconvEngine> {
    /// Open an iconv converter from `source` to `target`.
    ///
    /// The option's suffix is appended to the target name before it reaches
    /// `iconv_open`. Fails with [`Error::UnsupportedConversion`] when iconv
    /// rejects the pair.
    pub fn open(target: &str, source: &str, option: ConversionOption) -> Result<Self> {
        let suffixed = format!("{}{}", target, option.suffix());
        let engine =
            IconvEngine::open(&suffixed, source).map_err(|e| Error::UnsupportedConversion {
                from: source.to_string(),
                to: suffixed.clone(),
                source: e,
            })?;

        Ok(Self::from_engine(engine, target, source, option))
    }
}

impl<E: ConversionEngine> Converter<E> {
    /// Wrap an already constructed engine
    pub fn from_engine(
        engine: E,
        target: impl Into<String>,
        source: impl Into<String>,
        option: ConversionOption,
    ) -> Self {
        Self {
            engine: Some(engine),
            target: target.into(),
            source: source.into(),
            option,
            config: PumpConfig::default(),
        }
    }

    /// Replace the buffer configuration
    pub fn with_config(mut self, config: PumpConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Target encoding name, without the option suffix
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Source encoding name
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Conversion option requested at open time
    pub fn option(&self) -> ConversionOption {
        self.option
    }

    /// Buffer configuration in effect
    pub fn config(&self) -> &PumpConfig {
        &self.config
    }

    /// Whether the engine has not been released yet
    pub fn is_open(&self) -> bool {
        self.engine.is_some()
    }

    /// Convert everything `source` yields and write it to `sink`.
    ///
    /// Output already written when an error occurs stays in `sink`. The
    /// converter may be reused for another stream afterwards.
    pub fn execute<W, R>(&mut self, sink: &mut W, source: &mut R) -> Result<Summary>
    where
        W: Write + ?Sized,
        R: Read + ?Sized,
    {
        let engine = self.engine.as_mut().ok_or(Error::Closed)?;
        debug!(
            from = %self.source,
            to = %self.target,
            option = ?self.option,
            "starting conversion"
        );
        Pump::new(&self.config).run(engine, sink, source)
    }

    /// Release the engine. Further calls do nothing.
    pub fn close(&mut self) {
        if let Some(engine) = self.engine.take() {
            drop(engine);
            debug!(from = %self.source, to = %self.target, "converter closed");
        }
    }
}

impl<E: ConversionEngine> Drop for Converter<E> {
    fn drop(&mut self) {
        self.close();
    }
}
