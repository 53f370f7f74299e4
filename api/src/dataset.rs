//! Read-only reference dataset of historical transactions, loaded once at
//! startup and never mutated. The service runs fine without it: an absent
//! or unreadable file just means the dataset reports as not loaded.

use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Default)]
pub struct ReferenceDataset {
    headers: Vec<String>,
    rows: usize,
}

impl ReferenceDataset {
    /// Dataset placeholder used when no file is configured.
    pub fn empty() -> Self {
        ReferenceDataset::default()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, csv::Error> {
        let file = File::open(path.as_ref()).map_err(csv::Error::from)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, csv::Error> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let headers = csv_reader
            .headers()?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        let mut rows = 0;
        for record in csv_reader.records() {
            record?;
            rows += 1;
        }

        Ok(ReferenceDataset { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
}

/// Load the dataset named by `RISKGATE_DATASET_PATH`, if any. Load failures
/// are logged and degrade to an empty dataset; the oracle path does not
/// depend on it.
pub fn load_from_env() -> ReferenceDataset {
    let Some(path) = std::env::var("RISKGATE_DATASET_PATH")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
    else {
        tracing::info!("no reference dataset configured");
        return ReferenceDataset::empty();
    };

    match ReferenceDataset::load(&path) {
        Ok(dataset) => {
            if dataset.is_empty() {
                tracing::warn!(path = %path, "reference dataset loaded but contains no rows");
            } else {
                tracing::info!(
                    path = %path,
                    rows = dataset.len(),
                    columns = dataset.headers().len(),
                    "reference dataset loaded"
                );
            }
            dataset
        }
        Err(err) => {
            tracing::warn!(path = %path, error = %err, "failed to load reference dataset");
            ReferenceDataset::empty()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ReferenceDataset;

    #[test]
    fn counts_rows_and_keeps_headers() {
        let csv = "Transaction_ID,amount,location\n\
                   tx-1,100.0,Berlin\n\
                   tx-2,250.5,Mumbai\n";
        let dataset = ReferenceDataset::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.headers(), ["Transaction_ID", "amount", "location"]);
    }

    #[test]
    fn header_only_file_is_empty() {
        let dataset = ReferenceDataset::from_reader("a,b,c\n".as_bytes()).unwrap();
        assert!(dataset.is_empty());
    }

    #[test]
    fn ragged_rows_are_an_error() {
        let csv = "a,b\n1,2\n3\n";
        assert!(ReferenceDataset::from_reader(csv.as_bytes()).is_err());
    }
}
