//! Console messaging gateway.
//!
//! Messages are printed to stdout; uploaded documents are written to the
//! export directory.

use std::io::Write;
use std::path::{Path, PathBuf};

use incident_core::{slugify, FileUpload, GatewayError, GatewayResult, MessagingGateway};
use tracing::info;

pub struct ConsoleGateway {
    export_dir: PathBuf,
}

impl ConsoleGateway {
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self {
            export_dir: export_dir.into(),
        }
    }

    /// Where an upload is written. Only the final component of `filename` is
    /// used; without one the name is slugged from the title.
    pub fn export_path(&self, title: &str, filename: &str) -> PathBuf {
        if let Some(name) = Path::new(filename).file_name() {
            return self.export_dir.join(name);
        }
        let slug = slugify(title);
        let stem = if slug.is_empty() { "incident-log" } else { slug.as_str() };
        self.export_dir.join(format!("{}.md", stem))
    }
}

impl MessagingGateway for ConsoleGateway {
    fn send_message(&self, channel_id: &str, text: &str) -> GatewayResult<()> {
        let mut stdout = std::io::stdout().lock();
        for line in text.lines() {
            writeln!(stdout, "[{}] bot: {}", channel_id, line)?;
        }
        stdout.flush()?;
        Ok(())
    }

    fn upload_file(&self, title: &str, upload: FileUpload) -> GatewayResult<()> {
        if upload.content.is_empty() {
            return Err(GatewayError::Delivery(format!("{} is empty", title)));
        }
        std::fs::create_dir_all(&self.export_dir)?;
        let path = self.export_path(title, &upload.filename);
        std::fs::write(&path, &upload.content)?;
        info!("Wrote {:?} ({}) to {:?}", title, upload.file_type, path);
        self.send_message(
            &upload.channel_id,
            &format!("uploaded \"{}\" to {}", title, path.display()),
        )
    }
}
