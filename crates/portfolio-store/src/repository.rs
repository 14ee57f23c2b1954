use crate::error::StoreError;
use crate::format::{read_portfolio, write_portfolio};
use core_types::Portfolio;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// The `PortfolioRepository` owns the on-disk copy of the user's holdings.
///
/// It only persists and restores; deciding what to add or remove is the
/// caller's job.
#[derive(Debug, Clone)]
pub struct PortfolioRepository {
    path: PathBuf,
}

impl PortfolioRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the saved portfolio. A missing file is a fresh, empty portfolio.
    pub fn load(&self) -> Result<Portfolio, StoreError> {
        match File::open(&self.path) {
            Ok(file) => {
                let portfolio = read_portfolio(BufReader::new(file))?;
                debug!(path = %self.path.display(), holdings = portfolio.len(), "Loaded portfolio");
                Ok(portfolio)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No saved portfolio yet");
                Ok(Portfolio::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Writes the portfolio, replacing the previous copy.
    pub fn save(&self, portfolio: &Portfolio) -> Result<(), StoreError> {
        write_to(&self.path, portfolio)?;
        debug!(path = %self.path.display(), holdings = portfolio.len(), "Saved portfolio");
        Ok(())
    }

    /// Replaces the saved portfolio with the contents of `source`.
    ///
    /// `source` is fully validated first; on any error the saved portfolio is left untouched.
    pub fn import_from(&self, source: &Path) -> Result<Portfolio, StoreError> {
        let file = File::open(source)?;
        let portfolio = read_portfolio(BufReader::new(file))?;
        self.save(&portfolio)?;
        info!(source = %source.display(), holdings = portfolio.len(), "Imported portfolio");
        Ok(portfolio)
    }

    /// Copies the saved portfolio to `destination`. Returns the number of holdings written.
    pub fn export_to(&self, destination: &Path) -> Result<usize, StoreError> {
        let portfolio = self.load()?;
        write_to(destination, &portfolio)?;
        info!(destination = %destination.display(), holdings = portfolio.len(), "Exported portfolio");
        Ok(portfolio.len())
    }
}

fn write_to(path: &Path, portfolio: &Portfolio) -> Result<(), StoreError> {
    replace_file(path, |file| write_portfolio(portfolio, BufWriter::new(file)))
}

/// Writes through a sibling temp file that is renamed over `path` only once
/// `write` succeeds, so a failed write never leaves a truncated file behind.
fn replace_file<F>(path: &Path, write: F) -> Result<(), StoreError>
where
    F: FnOnce(&mut NamedTempFile) -> Result<(), StoreError>,
{
    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent)?;
            parent
        }
        None => Path::new("."),
    };

    let mut staged = NamedTempFile::new_in(parent)?;
    write(&mut staged)?;
    staged.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::Holding;
    use rust_decimal_macros::dec;
    use std::fs;
    use std::io::Write;

    fn sample() -> Portfolio {
        Portfolio::from_holdings(vec![
            Holding::parse("AAPL", dec!(10)).unwrap(),
            Holding::parse("MSFT", dec!(5)).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn missing_file_loads_as_empty_portfolio() {
        let dir = tempfile::tempdir().unwrap();
        let repo = PortfolioRepository::new(dir.path().join("portfolio.csv"));
        assert!(repo.load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_restores_holdings() {
        let dir = tempfile::tempdir().unwrap();
        let repo = PortfolioRepository::new(dir.path().join("nested/portfolio.csv"));

        repo.save(&sample()).unwrap();

        assert_eq!(repo.load().unwrap(), sample());
    }

    #[test]
    fn invalid_import_leaves_saved_portfolio_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let repo = PortfolioRepository::new(dir.path().join("portfolio.csv"));
        repo.save(&sample()).unwrap();

        let upload = dir.path().join("upload.csv");
        fs::write(&upload, "symbol,qty\nTSLA,1\n").unwrap();

        let err = repo.import_from(&upload).unwrap_err();
        assert!(matches!(err, StoreError::InvalidHeader(_)));
        assert_eq!(repo.load().unwrap(), sample());
    }

    #[test]
    fn failed_write_keeps_the_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portfolio.csv");
        let repo = PortfolioRepository::new(&path);
        repo.save(&sample()).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        let err = replace_file(&path, |file| {
            file.write_all(b"ticker,sh").unwrap();
            Err(StoreError::Io(std::io::Error::other("disk full")))
        })
        .unwrap_err();

        assert!(matches!(err, StoreError::Io(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn import_replaces_and_export_copies() {
        let dir = tempfile::tempdir().unwrap();
        let repo = PortfolioRepository::new(dir.path().join("portfolio.csv"));
        repo.save(&sample()).unwrap();

        let upload = dir.path().join("upload.csv");
        fs::write(&upload, "ticker,shares\ntsla,1.5\n").unwrap();
        let imported = repo.import_from(&upload).unwrap();
        assert_eq!(imported.len(), 1);

        let download = dir.path().join("download.csv");
        assert_eq!(repo.export_to(&download).unwrap(), 1);
        assert_eq!(
            fs::read_to_string(download).unwrap(),
            "ticker,shares\nTSLA,1.5\n"
        );
    }
}
