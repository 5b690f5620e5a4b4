use super::*;

#[derive(Clone, Default, Debug, Parser)]
#[command(group(
  ArgGroup::new("chains")
    .required(false)
    .args(["chain_argument", "regtest", "signet", "testnet"])
))]
pub struct Options {
  #[arg(
    long = "chain",
    value_enum,
    default_value = "mainnet",
    help = "Use <CHAIN>."
  )]
  pub(crate) chain_argument: Chain,
  #[arg(long, help = "Load configuration from <CONFIG>.")]
  pub(crate) config: Option<PathBuf>,
  #[arg(long, help = "Load node RPC cookie file from <COOKIE_FILE>.")]
  pub(crate) cookie_file: Option<PathBuf>,
  #[arg(
    long,
    env = "FEE_PER_KB",
    help = "Pay <FEE_PER_KB> satoshis per kilobyte of transaction size."
  )]
  pub(crate) fee_per_kb: Option<u64>,
  #[arg(
    long,
    env = "PENDING_TXS",
    help = "Queue unbroadcast transactions in <PENDING_TXS>."
  )]
  pub(crate) pending_txs: Option<PathBuf>,
  #[arg(long, short, help = "Use regtest. Equivalent to `--chain regtest`.")]
  pub(crate) regtest: bool,
  #[arg(long, env = "NODE_RPC_PASS", help = "Authenticate to node with <RPC_PASS>.")]
  pub(crate) rpc_pass: Option<String>,
  #[arg(long, env = "NODE_RPC_URL", help = "Connect to node at <RPC_URL>.")]
  pub(crate) rpc_url: Option<String>,
  #[arg(
    long,
    env = "NODE_RPC_USER",
    requires = "rpc_pass",
    help = "Authenticate to node as <RPC_USER>."
  )]
  pub(crate) rpc_user: Option<String>,
  #[arg(long, short, help = "Use signet. Equivalent to `--chain signet`.")]
  pub(crate) signet: bool,
  #[arg(
    long,
    short,
    env = "TESTNET",
    help = "Use testnet. Equivalent to `--chain testnet`."
  )]
  pub(crate) testnet: bool,
  #[arg(long, env = "WALLET", help = "Store wallet state in <WALLET>.")]
  pub(crate) wallet: Option<PathBuf>,
}

impl Options {
  pub(crate) fn chain(&self) -> Chain {
    if self.regtest {
      Chain::Regtest
    } else if self.signet {
      Chain::Signet
    } else if self.testnet {
      Chain::Testnet
    } else {
      self.chain_argument
    }
  }
}

#[cfg(test)]
mod tests {
  use {super::*, pretty_assertions::assert_eq};

  fn parse(args: &[&str]) -> Options {
    Arguments::try_parse_from(
      ["junkscriptions"]
        .into_iter()
        .chain(args.iter().copied())
        .chain(["wallet", "balance"]),
    )
    .unwrap()
    .options
  }

  #[test]
  fn chain_flags_override_default() {
    assert_eq!(parse(&[]).chain(), Chain::Mainnet);
    assert_eq!(parse(&["--chain", "regtest"]).chain(), Chain::Regtest);
    assert_eq!(parse(&["-t"]).chain(), Chain::Testnet);
    assert_eq!(parse(&["-s"]).chain(), Chain::Signet);
    assert_eq!(parse(&["-r"]).chain(), Chain::Regtest);
  }

  #[test]
  fn conflicting_chain_flags_are_rejected() {
    assert!(Arguments::try_parse_from([
      "junkscriptions",
      "--chain",
      "regtest",
      "-t",
      "wallet",
      "balance"
    ])
    .is_err());
  }

  #[test]
  fn rpc_user_requires_rpc_pass() {
    assert!(Arguments::try_parse_from([
      "junkscriptions",
      "--rpc-user",
      "satoshi",
      "wallet",
      "balance"
    ])
    .is_err());
    assert!(Arguments::try_parse_from([
      "junkscriptions",
      "--rpc-user",
      "satoshi",
      "--rpc-pass",
      "hunter2",
      "wallet",
      "balance"
    ])
    .is_ok());
  }
}
