//! Content extraction and PDF export

use std::path::PathBuf;

use rand::Rng;
use tracing::{debug, info};

use super::AutomationEngine;
use crate::actions::ExtractContentAction;
use crate::result::{ActionResult, Outcome};

/// Collapse whitespace inside lines and keep at most one blank line between
/// blocks.
pub(crate) fn normalize_extracted_text(raw: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut previous_blank = true;

    for line in raw.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            if !previous_blank {
                out.push(String::new());
            }
            previous_blank = true;
        } else {
            out.push(line);
            previous_blank = false;
        }
    }

    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

fn pdf_file_name() -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let suffix: u32 = rand::rng().random_range(1000..10000);
    format!("page_{}_{}.pdf", timestamp, suffix)
}

impl AutomationEngine {
    /// Main-content text of the page, falling back to markdown of the full
    /// HTML when nothing readable is found
    pub async fn extract_content(&self, params: ExtractContentAction) -> ActionResult {
        self.run("extract_content", |page| async move {
            let mut content = normalize_extracted_text(&page.extract_main_content().await?);
            if content.is_empty() {
                debug!("Main-content extraction was empty, converting full HTML");
                let html = page.html().await?;
                content = html2md::parse_html(&html).trim().to_string();
            }

            let message = if params.goal.trim().is_empty() {
                "Extracted page content".to_string()
            } else {
                format!("Extracted page content for goal: {}", params.goal.trim())
            };
            Ok(Outcome::success(message).with_content(content))
        })
        .await
    }

    pub async fn save_pdf(&self) -> ActionResult {
        self.run("save_pdf", |page| async move {
            let bytes = page.pdf().await?;

            tokio::fs::create_dir_all(&self.config.output_dir).await?;
            let path: PathBuf = self.config.output_dir.join(pdf_file_name());
            tokio::fs::write(&path, &bytes).await?;

            info!("Saved {} byte PDF to {}", bytes.len(), path.display());
            Ok(Outcome::success(format!("Saved page as PDF to {}", path.display()))
                .with_content(path.display().to_string()))
        })
        .await
    }
}
