use super::*;

pub mod extract;
pub mod mint;
pub mod server;
pub mod token;
pub mod wallet;

#[derive(Debug, Parser)]
pub(crate) enum Subcommand {
  #[command(about = "Extract an inscription from the chain")]
  Extract(extract::Extract),
  #[command(about = "Mint an inscription")]
  Mint(mint::Mint),
  #[command(about = "Serve inscriptions over HTTP")]
  Server(server::Server),
  #[command(subcommand, about = "Deploy, mint, and transfer jnk-20 tokens")]
  Token(token::Token),
  #[command(subcommand, about = "Manage the wallet")]
  Wallet(wallet::WalletCommand),
}

impl Subcommand {
  pub(crate) fn run(self, settings: Settings) -> Result {
    match self {
      Self::Extract(extract) => extract.run(settings),
      Self::Mint(mint) => mint.run(settings),
      Self::Server(server) => server.run(settings),
      Self::Token(token) => token.run(settings),
      Self::Wallet(wallet) => wallet.run(settings),
    }
  }
}
