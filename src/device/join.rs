//! ABP and OTAA join procedures

use embedded_hal::blocking::delay::DelayMs;

use super::{DeviceError, Rn2xx3};
use crate::{
    codec::{self, Hex},
    config::device::{AbpKeys, AesKey, DevAddr, Eui64, JoinMode, OtaaKeys, FALLBACK_DEV_EUI},
    module::ModuleVariant,
    protocol::{
        classify,
        commands::{self, join_command},
        Response,
    },
    transport::Transport,
};

/// Data rate forced for ABP sessions
const ABP_DATA_RATE: u8 = 5;

impl<T: Transport, D: DelayMs<u32>> Rn2xx3<T, D> {
    /// Join using activation by personalization
    ///
    /// On success the keys and the ABP join mode are stored for [`Rn2xx3::join`].
    /// On failure the previously stored state is kept.
    pub fn join_abp(
        &mut self,
        dev_addr: DevAddr,
        app_skey: AesKey,
        nwk_skey: AesKey,
    ) -> Result<(), DeviceError<T::Error>> {
        self.run_abp(AbpKeys {
            dev_addr,
            app_skey,
            nwk_skey,
        })
    }

    /// Join using over-the-air activation
    ///
    /// Without `dev_eui` the module's hardware EUI is used. On success the keys
    /// and the OTAA join mode are stored for [`Rn2xx3::join`].
    pub fn join_otaa(
        &mut self,
        app_eui: Eui64,
        app_key: AesKey,
        dev_eui: Option<Eui64>,
    ) -> Result<(), DeviceError<T::Error>> {
        self.run_otaa(OtaaKeys {
            app_eui,
            app_key,
            dev_eui,
        })
    }

    /// Join again with the stored join mode and credentials
    pub fn join(&mut self) -> Result<(), DeviceError<T::Error>> {
        match self.join_mode {
            JoinMode::Abp => {
                let keys = self
                    .credentials
                    .abp()
                    .ok_or(DeviceError::MissingCredentials)?;
                self.run_abp(keys)
            }
            JoinMode::Otaa => {
                let keys = self
                    .credentials
                    .otaa()
                    .ok_or(DeviceError::MissingCredentials)?;
                self.run_otaa(keys)
            }
        }
    }

    fn run_abp(&mut self, keys: AbpKeys) -> Result<(), DeviceError<T::Error>> {
        let variant = self.resolve_for_join()?;
        info!("ABP join on {:?}", variant);

        self.reset(variant)?;
        self.command_fmt(format_args!("mac set nwkskey {}", Hex(&keys.nwk_skey)))?;
        self.command_fmt(format_args!("mac set appskey {}", Hex(&keys.app_skey)))?;
        self.command_fmt(format_args!("mac set devaddr {}", Hex(&keys.dev_addr)))?;
        self.command(commands::MAC_SET_ADR_OFF)?;
        self.command(commands::MAC_SET_AR_OFF)?;
        self.command_fmt(format_args!("mac set pwridx {}", variant.power_index()))?;
        self.command_fmt(format_args!("mac set dr {}", ABP_DATA_RATE))?;

        let accepted = self.with_timeout(
            self.config.network_timeout_ms,
            |dev| -> Result<bool, DeviceError<T::Error>> {
                dev.command(commands::MAC_SAVE)?;
                dev.join_attempt(JoinMode::Abp)
            },
        )?;
        self.delay.delay_ms(self.config.settle_delay_ms);

        if !accepted {
            warn!("ABP join not accepted");
            return Err(DeviceError::JoinDenied);
        }
        self.credentials.commit_abp(keys);
        self.join_mode = JoinMode::Abp;
        info!("ABP join accepted");
        Ok(())
    }

    fn run_otaa(&mut self, keys: OtaaKeys) -> Result<(), DeviceError<T::Error>> {
        let variant = self.resolve_for_join()?;
        info!("OTAA join on {:?}", variant);

        let dev_eui = match keys.dev_eui {
            Some(eui) => eui,
            None => self.hardware_eui()?,
        };

        self.reset(variant)?;
        self.command_fmt(format_args!("mac set appeui {}", Hex(&keys.app_eui)))?;
        self.command_fmt(format_args!("mac set appkey {}", Hex(&keys.app_key)))?;
        self.command_fmt(format_args!("mac set deveui {}", Hex(&dev_eui)))?;
        self.command_fmt(format_args!("mac set pwridx {}", variant.power_index()))?;
        self.command(commands::MAC_SET_ADR_OFF)?;
        if variant.needs_rx2_setup() {
            self.command(commands::MAC_SET_RX2_EU)?;
        }

        let attempts = self.config.otaa_join_attempts;
        let settle_ms = self.config.settle_delay_ms;
        let joined = self.with_timeout(
            self.config.network_timeout_ms,
            |dev| -> Result<bool, DeviceError<T::Error>> {
                dev.command(commands::MAC_SAVE)?;
                for attempt in 1..=attempts {
                    let accepted = dev.join_attempt(JoinMode::Otaa)?;
                    dev.delay.delay_ms(settle_ms);
                    if accepted {
                        return Ok(true);
                    }
                    warn!("OTAA join attempt {} of {} not accepted", attempt, attempts);
                }
                Ok(false)
            },
        )?;

        if !joined {
            return Err(DeviceError::JoinDenied);
        }
        self.credentials.commit_otaa(keys);
        self.join_mode = JoinMode::Otaa;
        info!("OTAA join accepted");
        Ok(())
    }

    /// Identify the module; an unknown module ends the join before any setup
    fn resolve_for_join(&mut self) -> Result<ModuleVariant, DeviceError<T::Error>> {
        match self.resolve()? {
            ModuleVariant::Unknown => {
                warn!("join aborted: unknown module");
                Err(DeviceError::UnknownModule)
            }
            variant => Ok(variant),
        }
    }

    fn reset(&mut self, variant: ModuleVariant) -> Result<(), DeviceError<T::Error>> {
        let command = variant.reset_command().ok_or(DeviceError::UnknownModule)?;
        self.command(command)?;
        Ok(())
    }

    /// Hardware EUI, or the fallback EUI if the module reports nothing usable
    fn hardware_eui(&mut self) -> Result<Eui64, DeviceError<T::Error>> {
        let line = self.query(commands::SYS_GET_HWEUI)?;
        match codec::decode_array(&line) {
            Ok(eui) => Ok(eui),
            Err(_) => {
                warn!("no usable hardware EUI, using fallback");
                Ok(FALLBACK_DEV_EUI)
            }
        }
    }

    /// Issue `mac join` and report whether the network accepted it
    ///
    /// The module acknowledges with `ok` and reports the outcome on a second
    /// line. Any other first line is already the outcome.
    fn join_attempt(&mut self, mode: JoinMode) -> Result<bool, DeviceError<T::Error>> {
        let ack = self.command(join_command(mode == JoinMode::Otaa))?;
        let outcome = if classify(&ack) == Response::Ok {
            let line = self.transport.read_line().map_err(DeviceError::Transport)?;
            trace!("< {}", line.as_str());
            classify(&line)
        } else {
            classify(&ack)
        };
        debug!("{:?} join: {:?}", mode, outcome);
        Ok(outcome == Response::Accepted)
    }
}
