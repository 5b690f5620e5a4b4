use {super::*, bitcoincore_rpc::Auth};

/// On-disk configuration, merged under command line flags and environment
/// variables.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub(crate) struct Config {
  pub(crate) fee_per_kb: Option<u64>,
  pub(crate) pending_txs: Option<PathBuf>,
  pub(crate) rpc_pass: Option<String>,
  pub(crate) rpc_url: Option<String>,
  pub(crate) rpc_user: Option<String>,
  pub(crate) wallet: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub(crate) struct Settings {
  chain: Chain,
  cookie_file: Option<PathBuf>,
  fee_per_kb: Option<u64>,
  pending_txs: PathBuf,
  rpc_pass: Option<String>,
  rpc_url: Option<String>,
  rpc_user: Option<String>,
  wallet: PathBuf,
}

impl Settings {
  pub(crate) fn load(options: Options) -> Result<Self> {
    let config = match &options.config {
      Some(path) => serde_yaml::from_str::<Config>(
        &fs::read_to_string(path)
          .with_context(|| format!("failed to read config at `{}`", path.display()))?,
      )
      .with_context(|| format!("failed to parse config at `{}`", path.display()))?,
      None => Config::default(),
    };

    Ok(Self {
      chain: options.chain(),
      cookie_file: options.cookie_file,
      fee_per_kb: options.fee_per_kb.or(config.fee_per_kb),
      pending_txs: options
        .pending_txs
        .or(config.pending_txs)
        .unwrap_or_else(|| "pending-txs.json".into()),
      rpc_pass: options.rpc_pass.or(config.rpc_pass),
      rpc_url: options.rpc_url.or(config.rpc_url),
      rpc_user: options.rpc_user.or(config.rpc_user),
      wallet: options
        .wallet
        .or(config.wallet)
        .unwrap_or_else(|| ".wallet.json".into()),
    })
  }

  pub(crate) fn chain(&self) -> Chain {
    self.chain
  }

  pub(crate) fn fee_rate(&self) -> Result<FeeRate> {
    self
      .fee_per_kb
      .map(FeeRate::try_from)
      .transpose()
      .map(Option::unwrap_or_default)
  }

  pub(crate) fn wallet_store(&self) -> WalletStore {
    WalletStore::new(self.wallet.clone(), self.chain.network())
  }

  pub(crate) fn pending_queue(&self) -> PendingQueue {
    PendingQueue::new(self.pending_txs.clone())
  }

  pub(crate) fn node(&self) -> Result<CoreClient> {
    let url = self
      .rpc_url
      .as_deref()
      .context("no node RPC URL: pass --rpc-url or set NODE_RPC_URL")?;

    CoreClient::new(url, self.auth()?)
  }

  fn auth(&self) -> Result<Auth> {
    if let (Some(user), Some(pass)) = (&self.rpc_user, &self.rpc_pass) {
      return Ok(Auth::UserPass(user.clone(), pass.clone()));
    }

    Ok(Auth::CookieFile(match &self.cookie_file {
      Some(path) => path.clone(),
      None => self.default_cookie_file()?,
    }))
  }

  fn default_cookie_file(&self) -> Result<PathBuf> {
    let home = dirs::home_dir().context("failed to determine home directory")?;

    Ok(
      self
        .chain
        .join_with_data_dir(&home.join(".junkcoin"))
        .join(".cookie"),
    )
  }
}

#[cfg(test)]
mod tests {
  use {super::*, pretty_assertions::assert_eq};

  #[test]
  fn defaults() {
    let settings = Settings::load(Options::default()).unwrap();

    assert_eq!(settings.chain(), Chain::Mainnet);
    assert_eq!(settings.fee_rate().unwrap(), FeeRate::default());
    assert_eq!(settings.pending_txs, PathBuf::from("pending-txs.json"));
    assert_eq!(settings.wallet, PathBuf::from(".wallet.json"));
  }

  #[test]
  fn missing_rpc_url_is_an_error() {
    assert!(Settings::load(Options::default())
      .unwrap()
      .node()
      .unwrap_err()
      .to_string()
      .contains("no node RPC URL"));
  }

  #[test]
  fn options_override_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("junkscriptions.yaml");

    fs::write(
      &config,
      "rpc-url: http://config:22555\nfee-per-kb: 5000\nwallet: config-wallet.json\n",
    )
    .unwrap();

    let settings = Settings::load(Options {
      config: Some(config.clone()),
      rpc_url: Some("http://flag:22555".into()),
      ..Default::default()
    })
    .unwrap();

    assert_eq!(settings.rpc_url.as_deref(), Some("http://flag:22555"));
    assert_eq!(settings.fee_rate().unwrap(), FeeRate::try_from(5000).unwrap());
    assert_eq!(settings.wallet, PathBuf::from("config-wallet.json"));
  }

  #[test]
  fn unknown_config_fields_are_rejected() {
    assert!(serde_yaml::from_str::<Config>("fee-per-kb: 1000\nbogus: 1\n").is_err());
  }

  #[test]
  fn zero_fee_rate_is_rejected() {
    let settings = Settings::load(Options {
      fee_per_kb: Some(0),
      ..Default::default()
    })
    .unwrap();

    assert!(settings.fee_rate().is_err());
  }
}
