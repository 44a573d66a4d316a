//! UI type tags carried by metadata columns.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The UI type of a column (`uidt`).
///
/// Physical columns get one of the data-bearing variants from the type mapper;
/// virtual columns use `LinkToAnotherRecord`, `Links`, `Rollup`, `Lookup`,
/// `Formula` and friends and own a column-options record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UiType {
    ID,
    ForeignKey,
    LinkToAnotherRecord,
    Links,
    Lookup,
    Rollup,
    Formula,
    QrCode,
    Barcode,
    Button,
    SingleLineText,
    LongText,
    Attachment,
    Checkbox,
    MultiSelect,
    SingleSelect,
    Date,
    Year,
    Time,
    DateTime,
    Number,
    Decimal,
    Currency,
    Percent,
    Duration,
    Rating,
    Email,
    URL,
    PhoneNumber,
    JSON,
    Geometry,
    SpecificDBType,
}

impl UiType {
    /// Whether the column has no physical counterpart in the live schema.
    pub fn is_virtual(&self) -> bool {
        matches!(
            self,
            UiType::LinkToAnotherRecord
                | UiType::Links
                | UiType::Lookup
                | UiType::Rollup
                | UiType::Formula
                | UiType::QrCode
                | UiType::Barcode
                | UiType::Button
        )
    }

    /// Whether the column is a relation column (owns link options).
    pub fn is_link(&self) -> bool {
        matches!(self, UiType::LinkToAnotherRecord | UiType::Links)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UiType::ID => "ID",
            UiType::ForeignKey => "ForeignKey",
            UiType::LinkToAnotherRecord => "LinkToAnotherRecord",
            UiType::Links => "Links",
            UiType::Lookup => "Lookup",
            UiType::Rollup => "Rollup",
            UiType::Formula => "Formula",
            UiType::QrCode => "QrCode",
            UiType::Barcode => "Barcode",
            UiType::Button => "Button",
            UiType::SingleLineText => "SingleLineText",
            UiType::LongText => "LongText",
            UiType::Attachment => "Attachment",
            UiType::Checkbox => "Checkbox",
            UiType::MultiSelect => "MultiSelect",
            UiType::SingleSelect => "SingleSelect",
            UiType::Date => "Date",
            UiType::Year => "Year",
            UiType::Time => "Time",
            UiType::DateTime => "DateTime",
            UiType::Number => "Number",
            UiType::Decimal => "Decimal",
            UiType::Currency => "Currency",
            UiType::Percent => "Percent",
            UiType::Duration => "Duration",
            UiType::Rating => "Rating",
            UiType::Email => "Email",
            UiType::URL => "URL",
            UiType::PhoneNumber => "PhoneNumber",
            UiType::JSON => "JSON",
            UiType::Geometry => "Geometry",
            UiType::SpecificDBType => "SpecificDBType",
        }
    }
}

impl fmt::Display for UiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
