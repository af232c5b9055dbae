/// EUI-64 (8 bytes)
pub type Eui64 = [u8; 8];
/// AES-128 key (16 bytes)
pub type AesKey = [u8; 16];
/// Device Address (4 bytes)
pub type DevAddr = [u8; 4];

/// Device EUI used when none is supplied and the module reports no usable hardware EUI
pub const FALLBACK_DEV_EUI: Eui64 = [0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77];

/// Activation method used by the last successful join
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinMode {
    /// Activation by personalization (pre-shared session keys)
    Abp,
    /// Over-the-air activation
    #[default]
    Otaa,
}

/// Keys and identifiers last committed to the module
///
/// `None` means the value was never set.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Application EUI (OTAA)
    pub app_eui: Option<Eui64>,
    /// Application key (OTAA)
    pub app_key: Option<AesKey>,
    /// Device EUI (OTAA); `None` means use the module's hardware EUI
    pub dev_eui: Option<Eui64>,
    /// Device address (ABP)
    pub dev_addr: Option<DevAddr>,
    /// Network session key (ABP)
    pub nwk_skey: Option<AesKey>,
    /// Application session key (ABP)
    pub app_skey: Option<AesKey>,
}

/// Complete ABP credential set
#[derive(Debug, Clone, Copy)]
pub(crate) struct AbpKeys {
    pub dev_addr: DevAddr,
    pub app_skey: AesKey,
    pub nwk_skey: AesKey,
}

/// Complete OTAA credential set
#[derive(Debug, Clone, Copy)]
pub(crate) struct OtaaKeys {
    pub app_eui: Eui64,
    pub app_key: AesKey,
    pub dev_eui: Option<Eui64>,
}

impl Credentials {
    /// Create an empty credential set
    pub fn new() -> Self {
        Self::default()
    }

    /// ABP keys, if all of them are set
    pub(crate) fn abp(&self) -> Option<AbpKeys> {
        Some(AbpKeys {
            dev_addr: self.dev_addr?,
            app_skey: self.app_skey?,
            nwk_skey: self.nwk_skey?,
        })
    }

    /// OTAA keys, if the application EUI and key are set
    pub(crate) fn otaa(&self) -> Option<OtaaKeys> {
        Some(OtaaKeys {
            app_eui: self.app_eui?,
            app_key: self.app_key?,
            dev_eui: self.dev_eui,
        })
    }

    /// Replace the ABP set after a successful personalization join
    pub(crate) fn commit_abp(&mut self, keys: AbpKeys) {
        self.dev_addr = Some(keys.dev_addr);
        self.app_skey = Some(keys.app_skey);
        self.nwk_skey = Some(keys.nwk_skey);
    }

    /// Replace the OTAA set after a successful over-the-air join
    pub(crate) fn commit_otaa(&mut self, keys: OtaaKeys) {
        self.app_eui = Some(keys.app_eui);
        self.app_key = Some(keys.app_key);
        self.dev_eui = keys.dev_eui;
    }
}
