use super::*;

/// How many times a transient rejection is retried before the run aborts
/// with the remaining transactions queued. One second between attempts,
/// so ten minutes of mempool congestion before giving up.
const TRANSIENT_RETRY_LIMIT: u32 = 600;

const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Unbroadcast transactions on disk, stored as consensus-serialized hex.
/// When a broadcast run is interrupted the unsent suffix lands here and a
/// later invocation resumes from it before doing anything else.
#[derive(Debug, Clone)]
pub(crate) struct PendingQueue {
  path: PathBuf,
}

impl PendingQueue {
  pub(crate) fn new(path: PathBuf) -> Self {
    Self { path }
  }

  pub(crate) fn path(&self) -> &Path {
    &self.path
  }

  pub(crate) fn exists(&self) -> bool {
    self.path.exists()
  }

  pub(crate) fn load(&self) -> Result<Vec<Transaction>> {
    let file = fs::read_to_string(&self.path)
      .with_context(|| format!("failed to read pending transactions at `{}`", self.path.display()))?;

    serde_json::from_str::<Vec<String>>(&file)?
      .into_iter()
      .map(|tx| Ok(consensus::deserialize(&hex::decode(tx)?)?))
      .collect()
  }

  pub(crate) fn save(&self, txs: &[Transaction]) -> Result {
    let txs = txs
      .iter()
      .map(consensus::encode::serialize_hex)
      .collect::<Vec<String>>();

    wallet::write_atomically(&self.path, serde_json::to_string(&txs)?.as_bytes())
  }

  pub(crate) fn clear(&self) -> Result {
    if self.exists() {
      fs::remove_file(&self.path)
        .with_context(|| format!("failed to remove `{}`", self.path.display()))?;
    }
    Ok(())
  }
}

/// Broadcasts a transaction chain in order, updating the wallet file after
/// every acceptance. On failure the unsent suffix is saved to the pending
/// queue and the error propagates; a clean run clears the queue.
pub(crate) fn broadcast_all(
  node: &dyn Node,
  store: &WalletStore,
  queue: &PendingQueue,
  txs: &[Transaction],
  retry: bool,
) -> Result {
  let mut wallet = store.load()?;

  for (i, tx) in txs.iter().enumerate() {
    match transmit(node, tx, retry) {
      Ok(txid) => {
        log::info!("broadcast {txid} ({}/{})", i + 1, txs.len());
        wallet.update(tx);
        store.save(&wallet)?;
      }
      Err(err) => {
        queue.save(&txs[i..])?;
        return Err(err).with_context(|| {
          format!(
            "broadcast interrupted, {} transaction(s) saved to `{}`, rerun to resume",
            txs.len() - i,
            queue.path().display(),
          )
        });
      }
    }
  }

  queue.clear()
}

fn transmit(node: &dyn Node, tx: &Transaction, retry: bool) -> Result<Txid> {
  let mut attempts = 0;

  loop {
    match node.broadcast(tx) {
      Ok(txid) => return Ok(txid),
      Err(BroadcastError::AlreadyAccepted { message }) => {
        let txid = tx.compute_txid();
        log::warn!("transaction {txid} was already accepted: {message}");
        return Ok(txid);
      }
      Err(BroadcastError::Transient { message }) if retry && attempts < TRANSIENT_RETRY_LIMIT => {
        attempts += 1;
        log::info!("retrying in {}s: {message}", RETRY_DELAY.as_secs());
        thread::sleep(RETRY_DELAY);
      }
      Err(err) => return Err(err.into()),
    }
  }
}
