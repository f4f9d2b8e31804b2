//! Alarm source port (driven/secondary port)

/// Port trait for reading the device's next-alarm string
///
/// The returned string is the raw platform representation, e.g.
/// `"Fri 6:30 AM"`. `Ok(None)` means no alarm is configured.
#[async_trait::async_trait]
pub trait IAlarmSource: Send + Sync {
    async fn next_alarm_raw(&self) -> anyhow::Result<Option<String>>;
}
