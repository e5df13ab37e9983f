//! Test-data generator

use verifile_core::FileProvider;

use crate::error::Result;

/// Write `count` new files named `file_<n>.txt` with random content.
///
/// Existing names are skipped, never overwritten. Returns the names written.
pub async fn generate_files(files: &dyn FileProvider, count: usize) -> Result<Vec<String>> {
    let mut written = Vec::with_capacity(count);
    let mut n = 1;

    while written.len() < count {
        let name = format!("file_{}.txt", n);
        n += 1;

        if files.exists(&name).await? {
            continue;
        }

        let content = uuid::Uuid::new_v4().to_string();
        files.write(&name, content.as_bytes()).await?;
        tracing::debug!(file = %name, "Generated file");
        written.push(name);
    }

    Ok(written)
}
