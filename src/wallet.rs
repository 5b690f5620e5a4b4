use {
  super::*,
  bitcoin::{ecdsa, script::Builder},
};

/// Maximum serialized length of a pay-to-pubkey-hash unlocking script: a
/// 73 byte DER signature push plus a 33 byte compressed key push. Used as a
/// stand-in while estimating fees so the computed fee never undershoots the
/// final signed size.
const P2PKH_UNLOCK_MAX_LEN: usize = 108;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Utxo {
  pub(crate) outpoint: OutPoint,
  pub(crate) script_pubkey: ScriptBuf,
  pub(crate) value: Amount,
}

/// The wallet is a single mutable resource: an address, its key, and the
/// set of unspent outputs the node reported for it. Concurrent invocations
/// against the same wallet file are unsafe; nothing locks it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Wallet {
  pub(crate) private_key: PrivateKey,
  pub(crate) address: Address,
  pub(crate) utxos: Vec<Utxo>,
}

impl Wallet {
  pub(crate) fn balance(&self) -> Amount {
    self.utxos.iter().map(|utxo| utxo.value).sum()
  }

  pub(crate) fn public_key(&self) -> PublicKey {
    self.private_key.public_key(&Secp256k1::new())
  }

  /// Selects UTXOs largest-first until they cover the transaction's outputs
  /// plus the estimated fee, appending a change output back to the wallet's
  /// own address. Change under the dust floor is absorbed into the fee.
  /// `carried` is the value already provided by inputs present on the
  /// transaction before funding.
  pub(crate) fn fund(&self, tx: &mut Transaction, carried: Amount, fee_rate: FeeRate) -> Result {
    let base = tx.output.iter().map(|output| output.value).sum::<Amount>();
    let first = tx.input.len();

    let mut candidates = self.utxos.clone();
    candidates.sort_by(|a, b| b.value.cmp(&a.value));

    tx.output.push(TxOut {
      value: Amount::ZERO,
      script_pubkey: self.address.script_pubkey(),
    });

    let mut candidates = candidates.into_iter();
    let mut selected = Vec::new();
    let mut input_value = carried;

    loop {
      let fee = fee_rate.fee(Self::estimated_size(tx, first));

      if let Some(change) = input_value.checked_sub(base + fee) {
        if change < DUST_LIMIT {
          tx.output.pop();
        } else if let Some(output) = tx.output.last_mut() {
          output.value = change;
        }

        self.sign_p2pkh_inputs(tx, first, &selected)?;

        return Ok(());
      }

      let Some(utxo) = candidates.next() else {
        bail!("not enough funds, top up the wallet and run `junkscriptions wallet sync`");
      };

      tx.input.push(TxIn {
        previous_output: utxo.outpoint,
        script_sig: ScriptBuf::new(),
        sequence: Sequence::MAX,
        witness: Witness::new(),
      });
      input_value += utxo.value;
      selected.push(utxo);
    }
  }

  /// Spends every UTXO the wallet holds, sending whatever remains after
  /// `outputs` and the fee to `change_to`. With no outputs this sweeps the
  /// full balance to the change address.
  pub(crate) fn spend_all(
    &self,
    outputs: Vec<TxOut>,
    change_to: &Address,
    fee_rate: FeeRate,
  ) -> Result<Transaction> {
    let base = outputs.iter().map(|output| output.value).sum::<Amount>();

    let mut tx = Transaction {
      version: Version::ONE,
      lock_time: LockTime::ZERO,
      input: self
        .utxos
        .iter()
        .map(|utxo| TxIn {
          previous_output: utxo.outpoint,
          script_sig: ScriptBuf::new(),
          sequence: Sequence::MAX,
          witness: Witness::new(),
        })
        .collect(),
      output: outputs,
    };

    tx.output.push(TxOut {
      value: Amount::ZERO,
      script_pubkey: change_to.script_pubkey(),
    });

    let fee = fee_rate.fee(Self::estimated_size(&tx, 0));

    let change = self
      .balance()
      .checked_sub(base + fee)
      .context("not enough funds, top up the wallet and run `junkscriptions wallet sync`")?;

    if change < DUST_LIMIT {
      tx.output.pop();
      ensure!(
        !tx.output.is_empty(),
        "not enough funds to cover the fee and a spendable output"
      );
    } else if let Some(output) = tx.output.last_mut() {
      output.value = change;
    }

    self.sign_p2pkh_inputs(&mut tx, 0, &self.utxos)?;

    Ok(tx)
  }

  fn estimated_size(tx: &Transaction, first: usize) -> usize {
    let mut tx = tx.clone();
    for input in tx.input.iter_mut().skip(first) {
      input.script_sig = ScriptBuf::from_bytes(vec![0; P2PKH_UNLOCK_MAX_LEN]);
    }
    tx.total_size()
  }

  pub(crate) fn sign_p2pkh_inputs(
    &self,
    tx: &mut Transaction,
    first: usize,
    utxos: &[Utxo],
  ) -> Result {
    let secp = Secp256k1::new();
    let public_key = self.private_key.public_key(&secp);
    let sighash_type = EcdsaSighashType::All;

    let mut signatures = Vec::new();

    {
      let sighash_cache = SighashCache::new(&*tx);

      for (i, utxo) in utxos.iter().enumerate() {
        let sighash = sighash_cache.legacy_signature_hash(
          first + i,
          &utxo.script_pubkey,
          sighash_type.to_u32(),
        )?;

        let signature = secp.sign_ecdsa(
          &Message::from_digest_slice(sighash.as_ref())?,
          &self.private_key.inner,
        );

        signatures.push(ecdsa::Signature {
          signature,
          sighash_type,
        });
      }
    }

    for (i, signature) in signatures.into_iter().enumerate() {
      tx.input[first + i].script_sig = Builder::new()
        .push_slice(PushBytesBuf::try_from(signature.to_vec())?)
        .push_key(&public_key)
        .into_script();
    }

    Ok(())
  }

  /// Applies a transaction to the UTXO set: spent outpoints leave, outputs
  /// paying the wallet's own address join.
  pub(crate) fn update(&mut self, tx: &Transaction) {
    self
      .utxos
      .retain(|utxo| !tx.input.iter().any(|input| input.previous_output == utxo.outpoint));

    let txid = tx.compute_txid();
    let own = self.address.script_pubkey();

    for (vout, output) in (0u32..).zip(&tx.output) {
      if output.script_pubkey == own {
        self.utxos.push(Utxo {
          outpoint: OutPoint { txid, vout },
          script_pubkey: output.script_pubkey.clone(),
          value: output.value,
        });
      }
    }
  }
}

#[derive(Debug, Serialize, Deserialize)]
struct WalletFile {
  privkey: String,
  address: String,
  utxos: Vec<UtxoRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct UtxoRecord {
  txid: Txid,
  vout: u32,
  script: ScriptBuf,
  satoshis: u64,
}

/// Wallet state on disk. The file is read before any operation that needs
/// balance or signing and rewritten whole after any mutation, through a
/// temp-file rename so a crash never leaves a partial write.
#[derive(Debug, Clone)]
pub(crate) struct WalletStore {
  path: PathBuf,
  network: Network,
}

impl WalletStore {
  pub(crate) fn new(path: PathBuf, network: Network) -> Self {
    Self { path, network }
  }

  pub(crate) fn path(&self) -> &Path {
    &self.path
  }

  pub(crate) fn exists(&self) -> bool {
    self.path.exists()
  }

  pub(crate) fn load(&self) -> Result<Wallet> {
    let file = fs::read_to_string(&self.path)
      .with_context(|| format!("failed to read wallet at `{}`", self.path.display()))?;

    let file = serde_json::from_str::<WalletFile>(&file)
      .with_context(|| format!("failed to parse wallet at `{}`", self.path.display()))?;

    Ok(Wallet {
      private_key: PrivateKey::from_wif(&file.privkey)?,
      address: file
        .address
        .parse::<Address<NetworkUnchecked>>()?
        .require_network(self.network)?,
      utxos: file
        .utxos
        .into_iter()
        .map(|utxo| Utxo {
          outpoint: OutPoint {
            txid: utxo.txid,
            vout: utxo.vout,
          },
          script_pubkey: utxo.script,
          value: Amount::from_sat(utxo.satoshis),
        })
        .collect(),
    })
  }

  pub(crate) fn save(&self, wallet: &Wallet) -> Result {
    let file = WalletFile {
      privkey: wallet.private_key.to_wif(),
      address: wallet.address.to_string(),
      utxos: wallet
        .utxos
        .iter()
        .map(|utxo| UtxoRecord {
          txid: utxo.outpoint.txid,
          vout: utxo.outpoint.vout,
          script: utxo.script_pubkey.clone(),
          satoshis: utxo.value.to_sat(),
        })
        .collect(),
    };

    write_atomically(&self.path, serde_json::to_string_pretty(&file)?.as_bytes())
  }
}

pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> Result {
  let dir = path
    .parent()
    .filter(|parent| !parent.as_os_str().is_empty())
    .unwrap_or(Path::new("."));

  let mut file = tempfile::NamedTempFile::new_in(dir)?;
  file.write_all(contents)?;
  file
    .persist(path)
    .with_context(|| format!("failed to persist `{}`", path.display()))?;

  Ok(())
}
