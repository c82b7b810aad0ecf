use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One recognized object instance as reported by the inference service.
///
/// Coordinates are normalized YOLO-style box values (center-x, center-y,
/// width, height), each in `[0, 1]`, still in binary floating point.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawDetection {
    pub class_label: String,
    pub cx: f64,
    pub cy: f64,
    pub width: f64,
    pub height: f64,
}

/// One recognized object instance in its persisted form.
///
/// Coordinates are exact decimals so the stored record round-trips without
/// binary float drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class_label: String,
    pub cx: Decimal,
    pub cy: Decimal,
    pub width: Decimal,
    pub height: Decimal,
}

impl Detection {
    pub fn from_raw(raw: &RawDetection) -> Result<Self, rust_decimal::Error> {
        Ok(Self {
            class_label: raw.class_label.clone(),
            cx: decimal_from_f64(raw.cx)?,
            cy: decimal_from_f64(raw.cy)?,
            width: decimal_from_f64(raw.width)?,
            height: decimal_from_f64(raw.height)?,
        })
    }
}

/// Convert an `f64` to a `Decimal` through its shortest display string.
///
/// Rust formats floats with the shortest decimal representation that parses
/// back to the same bits, so `0.512345` becomes exactly `0.512345` rather
/// than the long binary expansion a direct conversion would produce.
pub fn decimal_from_f64(value: f64) -> Result<Decimal, rust_decimal::Error> {
    value.to_string().parse()
}
