use super::*;

#[derive(Debug, Parser)]
pub(crate) enum WalletCommand {
  #[command(about = "Print the wallet balance in satoshis")]
  Balance,
  #[command(about = "Import a WIF private key as the wallet")]
  Import {
    #[arg(help = "Import <PRIVATE_KEY>.")]
    private_key: PrivateKey,
  },
  #[command(about = "Generate a new wallet")]
  New,
  #[command(about = "Send funds, or the whole balance if no amount is given")]
  Send {
    #[arg(help = "Send to <ADDRESS>.")]
    address: Address<NetworkUnchecked>,
    #[arg(help = "Send <AMOUNT> satoshis. Omit to sweep the wallet.")]
    amount: Option<u64>,
  },
  #[command(about = "Split the balance into equal outputs")]
  Split {
    #[arg(help = "Split into <OUTPUTS> outputs.")]
    outputs: u64,
  },
  #[command(about = "Refresh the wallet UTXO set from the node")]
  Sync,
}

impl WalletCommand {
  pub(crate) fn run(self, settings: Settings) -> Result {
    match self {
      Self::Balance => {
        let wallet = settings.wallet_store().load()?;
        println!("{}", wallet.balance().to_sat());
        Ok(())
      }
      Self::Import { private_key } => create(&settings, private_key),
      Self::New => create(&settings, PrivateKey::generate(settings.chain().network())),
      Self::Send { address, amount } => {
        let store = settings.wallet_store();
        let wallet = store.load()?;
        let address = address.require_network(settings.chain().network())?;
        let fee_rate = settings.fee_rate()?;

        let tx = match amount {
          Some(amount) => {
            let amount = Amount::from_sat(amount);

            ensure!(
              amount >= DUST_LIMIT,
              "amount of {amount} is below the dust floor of {DUST_LIMIT}",
            );

            let mut tx = Transaction {
              version: Version::ONE,
              lock_time: LockTime::ZERO,
              input: Vec::new(),
              output: vec![TxOut {
                value: amount,
                script_pubkey: address.script_pubkey(),
              }],
            };

            wallet.fund(&mut tx, Amount::ZERO, fee_rate)?;

            tx
          }
          None => wallet.spend_all(Vec::new(), &address, fee_rate)?,
        };

        transmit(&settings, &store, tx)
      }
      Self::Split { outputs } => {
        ensure!(outputs > 0, "cannot split into zero outputs");

        let store = settings.wallet_store();
        let wallet = store.load()?;

        let share = wallet.balance() / outputs;

        ensure!(
          share >= DUST_LIMIT,
          "balance of {} is too small to split into {outputs} outputs above the dust floor",
          wallet.balance(),
        );

        let outputs = (1..outputs)
          .map(|_| TxOut {
            value: share,
            script_pubkey: wallet.address.script_pubkey(),
          })
          .collect();

        let tx = wallet.spend_all(outputs, &wallet.address, settings.fee_rate()?)?;

        transmit(&settings, &store, tx)
      }
      Self::Sync => {
        let node = settings.node()?;
        let store = settings.wallet_store();

        let mut wallet = store.load()?;
        wallet.utxos = node.list_unspent(&wallet.address)?;
        store.save(&wallet)?;

        println!("{}", wallet.balance().to_sat());

        Ok(())
      }
    }
  }
}

fn create(settings: &Settings, private_key: PrivateKey) -> Result {
  let store = settings.wallet_store();

  ensure!(
    !store.exists(),
    "wallet already exists at `{}`",
    store.path().display(),
  );

  let network = settings.chain().network();

  ensure!(
    private_key.network == network.into(),
    "private key network does not match chain `{}`",
    settings.chain(),
  );

  let wallet = Wallet {
    address: Address::p2pkh(private_key.public_key(&Secp256k1::new()), network),
    private_key,
    utxos: Vec::new(),
  };

  // the wallet signs locally, the import only lets the node answer
  // listunspent for the address
  if let Err(err) = settings
    .node()
    .and_then(|node| node.import_private_key(&wallet.private_key, "junkscriptions"))
  {
    log::warn!("failed to import key into node: {err}");
  }

  store.save(&wallet)?;

  println!("{}", wallet.address);

  Ok(())
}

fn transmit(settings: &Settings, store: &WalletStore, tx: Transaction) -> Result {
  let txid = tx.compute_txid();

  broadcast::broadcast_all(
    &settings.node()?,
    store,
    &settings.pending_queue(),
    &[tx],
    true,
  )?;

  println!("{txid}");

  Ok(())
}
