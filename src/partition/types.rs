use std::borrow::Cow;

/// Partition type codes as understood by ESP-IDF.
#[derive(
    strum::FromRepr, strum::Display, strum::EnumString, strum::IntoStaticStr, Debug, Clone, Copy, PartialEq, Eq, Hash,
)]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum PartitionType {
    App = 0x00,
    Data = 0x01,
}

/// Subtypes of [`PartitionType::App`].
#[derive(
    strum::FromRepr, strum::Display, strum::EnumString, strum::IntoStaticStr, Debug, Clone, Copy, PartialEq, Eq, Hash,
)]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum AppSubtype {
    Factory = 0x00,
    #[strum(serialize = "ota_0")]
    Ota0 = 0x10,
    #[strum(serialize = "ota_1")]
    Ota1 = 0x11,
    #[strum(serialize = "ota_2")]
    Ota2 = 0x12,
    #[strum(serialize = "ota_3")]
    Ota3 = 0x13,
    #[strum(serialize = "ota_4")]
    Ota4 = 0x14,
    #[strum(serialize = "ota_5")]
    Ota5 = 0x15,
    #[strum(serialize = "ota_6")]
    Ota6 = 0x16,
    #[strum(serialize = "ota_7")]
    Ota7 = 0x17,
    #[strum(serialize = "ota_8")]
    Ota8 = 0x18,
    #[strum(serialize = "ota_9")]
    Ota9 = 0x19,
    #[strum(serialize = "ota_10")]
    Ota10 = 0x1A,
    #[strum(serialize = "ota_11")]
    Ota11 = 0x1B,
    #[strum(serialize = "ota_12")]
    Ota12 = 0x1C,
    #[strum(serialize = "ota_13")]
    Ota13 = 0x1D,
    #[strum(serialize = "ota_14")]
    Ota14 = 0x1E,
    #[strum(serialize = "ota_15")]
    Ota15 = 0x1F,
    Test = 0x20,
}

const APP_OTA_MIN: u8 = AppSubtype::Ota0 as u8;
const APP_OTA_MAX: u8 = AppSubtype::Ota15 as u8;

/// Number of OTA app slots a table can describe.
pub const MAX_OTA_SLOTS: u32 = (APP_OTA_MAX - APP_OTA_MIN + 1) as u32;

impl AppSubtype {
    /// The OTA slot served by this subtype, `Some(0)` for `ota_0`.
    pub fn ota_index(self) -> Option<u32> {
        let code = self as u8;
        (APP_OTA_MIN..=APP_OTA_MAX)
            .contains(&code)
            .then(|| (code - APP_OTA_MIN) as u32)
    }

    /// The subtype serving OTA slot `index`.
    pub fn for_ota_index(index: u32) -> Option<Self> {
        if index >= MAX_OTA_SLOTS {
            return None;
        }
        Self::from_repr(APP_OTA_MIN + index as u8)
    }
}

/// Subtypes of [`PartitionType::Data`].
#[derive(
    strum::FromRepr, strum::Display, strum::EnumString, strum::IntoStaticStr, Debug, Clone, Copy, PartialEq, Eq, Hash,
)]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum DataSubtype {
    Ota = 0x00,
    Phy = 0x01,
    Nvs = 0x02,
    Coredump = 0x03,
    NvsKeys = 0x04,
    Efuse = 0x05,
    Undefined = 0x06,
    Esphttpd = 0x80,
    Fat = 0x81,
    Spiffs = 0x82,
    Littlefs = 0x83,
}

/// Human readable name of a partition type byte. Unknown codes render as
/// `type_<hex>`.
pub fn type_name(part_type: u8) -> Cow<'static, str> {
    match PartitionType::from_repr(part_type) {
        Some(t) => Cow::Borrowed(t.into()),
        None => Cow::Owned(format!("type_{part_type:02x}")),
    }
}

/// Human readable name of a subtype byte. The meaning of a subtype depends on
/// the partition type, so both are needed. Unknown combinations render as
/// `subtype_<hex>`.
pub fn subtype_name(part_type: u8, subtype: u8) -> Cow<'static, str> {
    let known: Option<&'static str> = match PartitionType::from_repr(part_type) {
        Some(PartitionType::App) => AppSubtype::from_repr(subtype).map(Into::into),
        Some(PartitionType::Data) => DataSubtype::from_repr(subtype).map(Into::into),
        None => None,
    };

    match known {
        Some(name) => Cow::Borrowed(name),
        None => Cow::Owned(format!("subtype_{subtype:02x}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_names() {
        assert_eq!(type_name(0x00), "app");
        assert_eq!(type_name(0x01), "data");
        assert_eq!(subtype_name(0x00, 0x00), "factory");
        assert_eq!(subtype_name(0x00, 0x11), "ota_1");
        assert_eq!(subtype_name(0x00, 0x20), "test");
        assert_eq!(subtype_name(0x01, 0x02), "nvs");
        assert_eq!(subtype_name(0x01, 0x04), "nvs_keys");
        assert_eq!(subtype_name(0x01, 0x82), "spiffs");
    }

    #[test]
    fn test_subtype_depends_on_type() {
        assert_eq!(subtype_name(0x00, 0x00), "factory");
        assert_eq!(subtype_name(0x01, 0x00), "ota");
        assert_eq!(subtype_name(0x00, 0x02), "subtype_02");
    }

    #[test]
    fn test_unknown_codes() {
        assert_eq!(type_name(0x40), "type_40");
        assert_eq!(subtype_name(0x40, 0x01), "subtype_01");
        assert_eq!(subtype_name(0x01, 0xfe), "subtype_fe");
    }

    #[test]
    fn test_ota_index() {
        assert_eq!(AppSubtype::Ota0.ota_index(), Some(0));
        assert_eq!(AppSubtype::Ota15.ota_index(), Some(15));
        assert_eq!(AppSubtype::Factory.ota_index(), None);
        assert_eq!(AppSubtype::for_ota_index(2), Some(AppSubtype::Ota2));
        assert_eq!(AppSubtype::for_ota_index(16), None);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("ota_3".parse::<AppSubtype>(), Ok(AppSubtype::Ota3));
        assert_eq!("nvs_keys".parse::<DataSubtype>(), Ok(DataSubtype::NvsKeys));
        assert_eq!("data".parse::<PartitionType>(), Ok(PartitionType::Data));
    }
}
