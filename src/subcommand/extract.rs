use super::*;

#[derive(Debug, Parser)]
pub(crate) struct Extract {
  #[arg(help = "Extract the inscription revealed by <TXID>.")]
  txid: Txid,
  #[arg(long, help = "Write the inscription body to <OUTPUT> instead of stdout.")]
  output: Option<PathBuf>,
}

impl Extract {
  pub(crate) fn run(self, settings: Settings) -> Result {
    let envelope = crate::extract::extract(&settings.node()?, self.txid)?;

    eprintln!("content type: {}", envelope.content_type);

    match self.output {
      Some(path) => fs::write(&path, &envelope.body)
        .with_context(|| format!("failed to write `{}`", path.display()))?,
      None => io::stdout().write_all(&envelope.body)?,
    }

    Ok(())
  }
}
