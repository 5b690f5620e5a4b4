use super::*;

#[derive(Debug, Parser)]
pub(crate) struct Mint {
  #[arg(help = "Send the inscription to <DESTINATION>.")]
  destination: Address<NetworkUnchecked>,
  #[arg(
    help = "Inscribe the contents of <FILE>. With <HEX_DATA>, treated as the content type instead."
  )]
  file: String,
  #[arg(help = "Inscribe raw <HEX_DATA> instead of a file.")]
  hex_data: Option<String>,
  #[arg(long, default_value = "1", help = "Mint the inscription <REPEAT> times.")]
  repeat: u32,
}

impl Mint {
  pub(crate) fn run(self, settings: Settings) -> Result {
    let envelope = self.envelope()?;
    mint(&settings, self.destination, envelope, self.repeat)
  }

  fn envelope(&self) -> Result<Envelope> {
    if let Some(data) = &self.hex_data {
      return Envelope::new(self.file.clone(), hex::decode(data)?);
    }

    let path = Path::new(&self.file);

    let body =
      fs::read(path).with_context(|| format!("failed to read `{}`", path.display()))?;

    let content_type = mime_guess::from_path(path)
      .first()
      .with_context(|| format!("unrecognized file extension on `{}`", path.display()))?
      .to_string();

    if content_type == "application/json" {
      serde_json::from_slice::<serde_json::Value>(&body)
        .with_context(|| format!("`{}` is not valid JSON", path.display()))?;
    }

    Envelope::new(content_type, body)
  }
}

/// Inscribes `envelope` to `destination` `repeat` times, broadcasting each
/// chain as it is built. The printed txid is the first reveal, the
/// transaction indexers treat as the inscription's genesis.
pub(crate) fn mint(
  settings: &Settings,
  destination: Address<NetworkUnchecked>,
  envelope: Envelope,
  repeat: u32,
) -> Result {
  let destination = destination.require_network(settings.chain().network())?;

  let node = settings.node()?;
  let store = settings.wallet_store();
  let queue = settings.pending_queue();
  let fee_rate = settings.fee_rate()?;

  for _ in 0..repeat {
    let mut wallet = store.load()?;

    let txs = inscribe::inscribe(&mut wallet, &destination, &envelope, fee_rate)?;

    let genesis = txs[1].compute_txid();

    broadcast::broadcast_all(&node, &store, &queue, &txs, true)?;

    println!("{genesis}");
  }

  Ok(())
}
