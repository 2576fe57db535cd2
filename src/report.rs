//! Writing [`FrameRecord`]s out.
use std::io::Write;

use anyhow::Result;

use crate::pipeline::FrameRecord;

/// Receives one record per processed frame, in frame order.
pub trait RecordSink {
    fn write_record(&mut self, record: &FrameRecord) -> Result<()>;

    /// Called once after the last record.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl RecordSink for Vec<FrameRecord> {
    fn write_record(&mut self, record: &FrameRecord) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// One CSV row per frame:
/// `frame,min_temp,max_temp,temp_unit` followed by a
/// `<name>_raw,<name>_norm` pair per region. Missing raw
/// values are left empty.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvSink<W> {
    pub fn new(inner: W, region_names: &[String]) -> Result<Self> {
        let mut writer = csv::Writer::from_writer(inner);

        let mut header: Vec<String> = ["frame", "min_temp", "max_temp", "temp_unit"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        for name in region_names {
            header.push(format!("{}_raw", name));
            header.push(format!("{}_norm", name));
        }
        writer.write_record(&header)?;

        Ok(CsvSink { writer })
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("could not flush csv: {}", e.error()))
    }
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn write_record(&mut self, record: &FrameRecord) -> Result<()> {
        let mut row = vec![
            record.frame.to_string(),
            record.range.low.to_string(),
            record.range.high.to_string(),
            record.range.unit_label().to_string(),
        ];
        for sample in &record.samples {
            row.push(sample.raw.map(|v| v.to_string()).unwrap_or_default());
            row.push(sample.value.to_string());
        }
        self.writer.write_record(&row)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// One JSON object per line.
pub struct JsonSink<W: Write> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        JsonSink { out }
    }
}

impl<W: Write> RecordSink for JsonSink<W> {
    fn write_record(&mut self, record: &FrameRecord) -> Result<()> {
        serde_json::to_writer(&mut self.out, record)?;
        writeln!(self.out)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
