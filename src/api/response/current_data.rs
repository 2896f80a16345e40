use super::device_state::DeviceState;
use super::Status;
use crate::model::{PowerReading, POWER_KEY};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct DataItem {
    pub key: String,
    pub value: Option<Value>,
    pub unit: Option<String>,
    pub name: Option<String>,
}

impl DataItem {
    /// Numeric value of the entry, whether sent as a JSON number or a string.
    pub fn as_f64(&self) -> Option<f64> {
        match self.value.as_ref()? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }
}

/* POST /device/v1.0/currentData */
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentData {
    #[serde(flatten)]
    pub status: Status,
    pub device_sn: Option<String>,
    pub device_state: Option<DeviceState>,
    /// Unix timestamp (seconds) of the sample.
    pub collection_time: Option<i64>,
    pub data_list: Option<Vec<DataItem>>,
}

impl CurrentData {
    pub fn item(&self, key: &str) -> Option<&DataItem> {
        self.data_list.as_ref()?.iter().find(|item| item.key == key)
    }

    /// Current output power. Missing or non-numeric entries read as zero.
    pub fn power(&self) -> PowerReading {
        match self.item(POWER_KEY).and_then(DataItem::as_f64) {
            Some(milliwatts) => PowerReading::from_milliwatts(milliwatts),
            None => {
                log::warn!("No numeric {} entry in telemetry, assuming 0", POWER_KEY);
                PowerReading::ZERO
            }
        }
    }
}
