//! Asynchronous CSV reader with batch interface
//!
//! Streams `PointRequest`s from CSV input in fixed-size batches using
//! csv-async, so arbitrarily large inputs are processed with bounded memory.
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of PointRequests
//!                  ↓
//!           csv_format module
//!           (CsvRecord, convert_csv_record)
//! ```

use crate::io::csv_format::{convert_csv_record, CsvRecord};
use crate::types::{current_millis, PointError, PointRequest};
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Asynchronous CSV reader
///
/// Malformed rows are logged and skipped; they never end the stream.
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    malformed: Vec<PointError>,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            malformed: Vec::new(),
        }
    }

    /// Read up to `batch_size` requests
    ///
    /// Returns an empty vector once the input is exhausted.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<PointRequest> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<CsvRecord>();

        while batch.len() < batch_size {
            match records.next().await {
                Some(Ok(csv_record)) => {
                    batch.push(convert_csv_record(csv_record, current_millis()))
                }
                Some(Err(e)) => {
                    let error = PointError::from(e);
                    warn!(%error, "skipping malformed CSV row");
                    self.malformed.push(error);
                }
                None => break,
            }
        }

        batch
    }

    /// Rows skipped so far, in input order
    pub fn malformed_rows(&self) -> &[PointError] {
        &self.malformed
    }
}
