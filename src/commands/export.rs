use crate::api::Mode;
use crate::args::ExportArgs;
use crate::commands::{open_session, Out};
use crate::error::{ErrorType, IntoResult};
use crate::{export as csv_export, Config, Result};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub path: PathBuf,
    pub count: usize,
}

/// Writes every transaction to `transactions-<UTC date>.csv` in `args.out_dir()`.
pub async fn export(config: Config, mode: Mode, args: ExportArgs) -> Result<Out<ExportReport>> {
    let today = chrono::Utc::now().date_naive();
    let mut session = open_session(&config, mode, today).pub_result(ErrorType::Config)?;
    let transactions = session
        .all_transactions()
        .await
        .pub_result(ErrorType::Request)?;
    let path = csv_export::write_csv(args.out_dir(), &transactions, today)
        .await
        .pub_result(ErrorType::Export)?;
    let count = transactions.len();
    Ok(Out::new(
        format!("Exported {count} transactions to {}", path.display()),
        ExportReport { path, count },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;
    use crate::utils;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_export() {
        let env = TestEnv::new("http://localhost:8000").await;
        let dir = TempDir::new().unwrap();
        let out = export(env.config(), Mode::Testing, ExportArgs::new(dir.path()))
            .await
            .unwrap();
        let report = out.structure().unwrap();
        assert_eq!(report.count, 10);
        let name = report.path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("transactions-") && name.ends_with(".csv"));

        let contents = utils::read(&report.path).await.unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next(),
            Some("Date,Description,Amount,Category,Merchant,Recurring")
        );
        assert_eq!(lines.count(), 10);
    }
}
