use super::*;

#[derive(Debug, Parser)]
#[command(
  name = "junkscriptions",
  version,
  about = "Inscribe, extract, and serve junkscriptions"
)]
pub struct Arguments {
  #[command(flatten)]
  pub(crate) options: Options,
  #[command(subcommand)]
  pub(crate) subcommand: Subcommand,
}

impl Arguments {
  pub fn run(self) -> Result {
    let settings = Settings::load(self.options)?;

    let queue = settings.pending_queue();

    // an interrupted broadcast leaves a queue behind; drain it before doing
    // anything else so wallet state catches up with the chain
    if queue.exists() {
      let txs = queue.load()?;

      log::info!(
        "resuming {} pending transaction(s) from `{}`",
        txs.len(),
        queue.path().display(),
      );

      broadcast::broadcast_all(
        &settings.node()?,
        &settings.wallet_store(),
        &queue,
        &txs,
        false,
      )?;
    }

    self.subcommand.run(settings)
  }
}
