use super::*;

/// jnk-20 operations are ordinary inscriptions whose body is a small JSON
/// document, inscribed to the address that should hold the balance.
#[derive(Debug, Parser)]
pub(crate) enum Token {
  #[command(about = "Deploy a new jnk-20 token")]
  Deploy {
    #[arg(help = "Inscribe the deployment to <DESTINATION>.")]
    destination: Address<NetworkUnchecked>,
    #[arg(help = "Deploy token <TICK>.")]
    tick: String,
    #[arg(help = "Cap total supply at <MAX>.")]
    max: u64,
    #[arg(long, help = "Cap per-mint amounts at <LIMIT>.")]
    limit: Option<u64>,
  },
  #[command(about = "Mint jnk-20 tokens")]
  Mint {
    #[arg(help = "Mint to <DESTINATION>.")]
    destination: Address<NetworkUnchecked>,
    #[arg(help = "Mint token <TICK>.")]
    tick: String,
    #[arg(help = "Mint <AMOUNT> tokens.")]
    amount: u64,
    #[arg(long, default_value = "1", help = "Repeat the mint <REPEAT> times.")]
    repeat: u32,
  },
  #[command(about = "Transfer jnk-20 tokens")]
  Transfer {
    #[arg(help = "Inscribe the transfer to <DESTINATION>.")]
    destination: Address<NetworkUnchecked>,
    #[arg(help = "Transfer token <TICK>.")]
    tick: String,
    #[arg(help = "Transfer <AMOUNT> tokens.")]
    amount: u64,
    #[arg(long, default_value = "1", help = "Repeat the transfer <REPEAT> times.")]
    repeat: u32,
  },
}

const CONTENT_TYPE: &str = "text/plain;charset=utf-8";

impl Token {
  pub(crate) fn run(self, settings: Settings) -> Result {
    match self {
      Self::Deploy {
        destination,
        tick,
        max,
        limit,
      } => {
        let mut body = serde_json::json!({
          "p": "jnk-20",
          "op": "deploy",
          "tick": validated(tick)?,
          "max": max.to_string(),
        });

        if let Some(limit) = limit {
          body["lim"] = limit.to_string().into();
        }

        mint::mint(
          &settings,
          destination,
          Envelope::new(CONTENT_TYPE, body.to_string().into_bytes())?,
          1,
        )
      }
      Self::Mint {
        destination,
        tick,
        amount,
        repeat,
      } => mint::mint(
        &settings,
        destination,
        Envelope::new(
          CONTENT_TYPE,
          serde_json::json!({
            "p": "jnk-20",
            "op": "mint",
            "tick": validated(tick)?,
            "amt": amount.to_string(),
          })
          .to_string()
          .into_bytes(),
        )?,
        repeat,
      ),
      Self::Transfer {
        destination,
        tick,
        amount,
        repeat,
      } => mint::mint(
        &settings,
        destination,
        Envelope::new(
          CONTENT_TYPE,
          serde_json::json!({
            "p": "jnk-20",
            "op": "transfer",
            "tick": validated(tick)?,
            "amt": amount.to_string(),
          })
          .to_string()
          .into_bytes(),
        )?,
        repeat,
      ),
    }
  }
}

fn validated(tick: String) -> Result<String> {
  ensure!(
    tick.chars().count() == 4,
    "tick must be four characters, got `{tick}`",
  );

  Ok(tick.to_lowercase())
}
