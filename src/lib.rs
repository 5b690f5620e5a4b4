#![allow(clippy::result_large_err, clippy::too_many_arguments)]
#![deny(
  clippy::cast_lossless,
  clippy::cast_possible_truncation,
  clippy::cast_possible_wrap,
  clippy::cast_sign_loss
)]

use {
  self::{
    arguments::Arguments,
    broadcast::PendingQueue,
    chain::Chain,
    chunk::{Chunk, ChunkedScript},
    client::{BroadcastError, CoreClient, Node},
    envelope::Envelope,
    fee_rate::FeeRate,
    options::Options,
    settings::Settings,
    subcommand::Subcommand,
    wallet::{Utxo, Wallet, WalletStore},
  },
  anyhow::{bail, ensure, Context, Error},
  bitcoin::{
    address::{Address, NetworkUnchecked},
    blockdata::{constants::MAX_SCRIPT_ELEMENT_SIZE, locktime::absolute::LockTime, opcodes},
    consensus,
    hashes::Hash,
    script::PushBytesBuf,
    secp256k1::{Message, Secp256k1},
    sighash::{EcdsaSighashType, SighashCache},
    transaction::Version,
    Amount, Network, OutPoint, PrivateKey, PublicKey, ScriptBuf, Sequence, Transaction, TxIn,
    TxOut, Txid, Witness,
  },
  bitcoincore_rpc::RpcApi,
  clap::{ArgGroup, Parser},
  serde::{Deserialize, Serialize},
  snafu::Snafu,
  std::{
    collections::VecDeque,
    env, fs,
    io::{self, Write},
    path::{Path, PathBuf},
    process,
    str::FromStr,
    sync::Arc,
    thread,
    time::Duration,
  },
};

#[cfg(test)]
use pretty_assertions::assert_eq;

pub mod arguments;
mod broadcast;
mod chain;
mod chunk;
mod client;
mod envelope;
mod extract;
mod fee_rate;
mod inscribe;
mod options;
mod settings;
mod subcommand;
mod wallet;

type Result<T = (), E = Error> = std::result::Result<T, E>;

/// Value carried by every inscription output, both the intermediate P2SH
/// commitments and the final recipient output.
const INSCRIPTION_VALUE: Amount = Amount::from_sat(500_000);

/// Outputs below this value are uneconomical to spend; change under the
/// floor is absorbed into the fee instead.
const DUST_LIMIT: Amount = Amount::from_sat(100_000);

pub fn main() {
  env_logger::init();

  if let Err(err) = Arguments::parse().run() {
    eprintln!("error: {err}");
    err
      .chain()
      .skip(1)
      .for_each(|cause| eprintln!("because: {cause}"));
    if env::var_os("RUST_BACKTRACE")
      .map(|val| val == "1")
      .unwrap_or_default()
    {
      eprintln!("{}", err.backtrace());
    }
    process::exit(1);
  }
}
