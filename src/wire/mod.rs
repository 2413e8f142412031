pub mod records;
pub mod tlv;
