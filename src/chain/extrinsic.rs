//! Call data, signing payloads and signed extrinsic encoding.
//!
//! Produces version 4 signed extrinsics with the default signed extension
//! set of FRAME chains:
//!
//! | Extension | Extra | Additional |
//! |-----------|-------|------------|
//! | `CheckNonZeroSender` | - | - |
//! | `CheckSpecVersion` | - | `u32` |
//! | `CheckTxVersion` | - | `u32` |
//! | `CheckGenesis` | - | genesis hash |
//! | `CheckMortality` | era (immortal) | genesis hash |
//! | `CheckNonce` | `Compact<nonce>` | - |
//! | `CheckWeight` | - | - |
//! | `ChargeTransactionPayment` | `Compact<tip>` | - |
//! | `CheckMetadataHash` (optional) | mode `u8` | `Option<hash>` |

// ============================================================================
// Imports
// ============================================================================

use parity_scale_codec::{Compact, Decode, Encode};
use serde::{Deserialize, Serialize};
use sp_core::blake2_256;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Signed bit (0x80) over extrinsic format version 4.
const SIGNED_EXTRINSIC_V4: u8 = 0x84;

/// `MultiAddress::Id` variant index.
const MULTI_ADDRESS_ID: u8 = 0x00;

/// Encoded immortal era.
const IMMORTAL_ERA: u8 = 0x00;

/// Payloads longer than this are hashed before signing.
const MAX_UNHASHED_PAYLOAD: usize = 256;

/// Signed extension identifiers, in encoding order.
const SIGNED_EXTENSIONS: &[&str] = &[
    "CheckNonZeroSender",
    "CheckSpecVersion",
    "CheckTxVersion",
    "CheckGenesis",
    "CheckMortality",
    "CheckNonce",
    "CheckWeight",
    "ChargeTransactionPayment",
];

const METADATA_HASH_EXTENSION: &str = "CheckMetadataHash";

// ============================================================================
// Hex helpers
// ============================================================================

/// Encodes bytes as `0x`-prefixed lowercase hex.
#[inline]
#[must_use]
pub fn to_hex(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decodes hex with or without a `0x` prefix.
///
/// # Errors
///
/// Returns [`Error::Hex`] on malformed input.
pub fn from_hex(text: &str) -> Result<Vec<u8>> {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    Ok(hex::decode(digits)?)
}

/// Decodes a 32-byte hash from hex.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] when the input is not 32 bytes.
pub fn hash_from_hex(text: &str) -> Result<[u8; 32]> {
    let bytes = from_hex(text)?;
    <[u8; 32]>::try_from(bytes.as_slice())
        .map_err(|_| Error::invalid_argument(format!("expected 32-byte hash, got {} bytes", bytes.len())))
}

// ============================================================================
// Call
// ============================================================================

/// SCALE-encoded runtime call.
///
/// # Example
///
/// ```
/// use substrate_session::Call;
///
/// // System::remark(b"hi")
/// let call = Call::new(0, 0).arg(&b"hi".to_vec());
/// assert_eq!(call.to_hex(), "0x0000086869");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call(Vec<u8>);

impl Call {
    /// Starts a call for the given pallet and call indices.
    #[inline]
    #[must_use]
    pub fn new(pallet_index: u8, call_index: u8) -> Self {
        Self(vec![pallet_index, call_index])
    }

    /// Appends a SCALE-encoded argument.
    #[inline]
    #[must_use]
    pub fn arg<T: Encode + ?Sized>(mut self, value: &T) -> Self {
        value.encode_to(&mut self.0);
        self
    }

    /// Wraps already encoded call bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for fewer than two bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() < 2 {
            return Err(Error::invalid_argument(
                "call data must hold at least pallet and call index",
            ));
        }
        Ok(Self(bytes))
    }

    /// Parses hex-encoded call data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Hex`] or [`Error::InvalidArgument`].
    pub fn from_hex(text: &str) -> Result<Self> {
        Self::from_bytes(from_hex(text)?)
    }

    /// Pallet index.
    #[inline]
    #[must_use]
    pub fn pallet_index(&self) -> u8 {
        self.0[0]
    }

    /// Call index within the pallet.
    #[inline]
    #[must_use]
    pub fn call_index(&self) -> u8 {
        self.0[1]
    }

    /// Encoded bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Encoded bytes as hex.
    #[inline]
    #[must_use]
    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }
}

// ============================================================================
// Transaction
// ============================================================================

/// A prepared, unsigned transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Runtime call.
    pub call: Call,
    /// Tip paid to the block author.
    pub tip: u128,
}

impl Transaction {
    /// Creates a transaction without tip.
    #[inline]
    #[must_use]
    pub fn new(call: Call) -> Self {
        Self { call, tip: 0 }
    }

    /// Creates a transaction from hex call data.
    ///
    /// # Errors
    ///
    /// See [`Call::from_hex`].
    pub fn from_call_hex(text: &str) -> Result<Self> {
        Ok(Self::new(Call::from_hex(text)?))
    }

    /// Sets the tip.
    #[inline]
    #[must_use]
    pub fn with_tip(mut self, tip: u128) -> Self {
        self.tip = tip;
        self
    }
}

// ============================================================================
// ExtrinsicParams
// ============================================================================

/// Chain and account context needed to sign a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtrinsicParams {
    /// Runtime spec version.
    pub spec_version: u32,
    /// Runtime transaction version.
    pub transaction_version: u32,
    /// Genesis block hash.
    pub genesis_hash: [u8; 32],
    /// Sender nonce.
    pub nonce: u64,
    /// Tip.
    pub tip: u128,
    /// Include the `CheckMetadataHash` extension (disabled mode).
    pub metadata_hash_check: bool,
}

impl ExtrinsicParams {
    /// Encodes the signed extension "extra" section.
    #[must_use]
    pub fn extra(&self) -> Vec<u8> {
        let mut out = vec![IMMORTAL_ERA];
        Compact(self.nonce).encode_to(&mut out);
        Compact(self.tip).encode_to(&mut out);
        if self.metadata_hash_check {
            // Mode::Disabled
            out.push(0);
        }
        out
    }

    /// Encodes the signed extension "additional signed" section.
    #[must_use]
    pub fn additional(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(72);
        self.spec_version.encode_to(&mut out);
        self.transaction_version.encode_to(&mut out);
        out.extend_from_slice(&self.genesis_hash);
        // Immortal era checkpoints the genesis block
        out.extend_from_slice(&self.genesis_hash);
        if self.metadata_hash_check {
            None::<[u8; 32]>.encode_to(&mut out);
        }
        out
    }

    /// Names of the signed extensions in use, in encoding order.
    #[must_use]
    pub fn signed_extensions(&self) -> Vec<String> {
        let mut names: Vec<String> = SIGNED_EXTENSIONS.iter().map(|s| (*s).to_string()).collect();
        if self.metadata_hash_check {
            names.push(METADATA_HASH_EXTENSION.to_string());
        }
        names
    }
}

// ============================================================================
// SigningPayload
// ============================================================================

/// Bytes a signer commits to: `call ++ extra ++ additional`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningPayload(Vec<u8>);

impl SigningPayload {
    /// Builds the payload for `call` under `params`.
    #[must_use]
    pub fn new(call: &Call, params: &ExtrinsicParams) -> Self {
        let mut bytes = call.as_bytes().to_vec();
        bytes.extend(params.extra());
        bytes.extend(params.additional());
        Self(bytes)
    }

    /// Raw payload bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Message actually signed: blake2-256 of the payload if it is
    /// longer than 256 bytes, the payload itself otherwise.
    #[must_use]
    pub fn message(&self) -> Vec<u8> {
        if self.0.len() > MAX_UNHASHED_PAYLOAD {
            blake2_256(&self.0).to_vec()
        } else {
            self.0.clone()
        }
    }
}

// ============================================================================
// SignerPayload
// ============================================================================

/// JSON signing request handed to a wallet extension.
///
/// Numeric fields are `0x`-prefixed big-endian hex; byte fields are
/// `0x`-prefixed hex. The extension reconstructs the [`SigningPayload`]
/// from these fields and returns a hex-encoded [`MultiSignature`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignerPayload {
    /// SS58 address of the signer.
    pub address: String,
    /// Checkpoint block hash (genesis for immortal transactions).
    pub block_hash: String,
    /// Checkpoint block number.
    pub block_number: String,
    /// Encoded era.
    pub era: String,
    /// Genesis hash.
    pub genesis_hash: String,
    /// Encoded call.
    pub method: String,
    /// Sender nonce.
    pub nonce: String,
    /// Signed extension names.
    pub signed_extensions: Vec<String>,
    /// Runtime spec version.
    pub spec_version: String,
    /// Tip.
    pub tip: String,
    /// Runtime transaction version.
    pub transaction_version: String,
    /// Extrinsic format version.
    pub version: u8,
}

impl SignerPayload {
    /// Builds the extension request for `address` signing `call`.
    #[must_use]
    pub fn new(address: &str, call: &Call, params: &ExtrinsicParams) -> Self {
        let genesis = to_hex(params.genesis_hash);
        Self {
            address: address.to_string(),
            block_hash: genesis.clone(),
            block_number: format!("{:#010x}", 0u32),
            era: to_hex([IMMORTAL_ERA]),
            genesis_hash: genesis,
            method: call.to_hex(),
            nonce: format!("{:#010x}", params.nonce),
            signed_extensions: params.signed_extensions(),
            spec_version: format!("{:#010x}", params.spec_version),
            tip: format!("{:#034x}", params.tip),
            transaction_version: format!("{:#010x}", params.transaction_version),
            version: SIGNED_EXTRINSIC_V4 & 0x7f,
        }
    }
}

// ============================================================================
// MultiSignature
// ============================================================================

/// Signature tagged with its scheme, as the runtime expects it.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum MultiSignature {
    /// Ed25519 signature.
    #[codec(index = 0)]
    Ed25519([u8; 64]),
    /// Sr25519 signature.
    #[codec(index = 1)]
    Sr25519([u8; 64]),
    /// Recoverable ECDSA signature.
    #[codec(index = 2)]
    Ecdsa([u8; 65]),
}

impl MultiSignature {
    /// Parses a hex-encoded, scheme-tagged signature.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Hex`] or [`Error::Codec`] for malformed input, and
    /// [`Error::InvalidArgument`] for trailing bytes.
    pub fn from_hex(text: &str) -> Result<Self> {
        let bytes = from_hex(text)?;
        let mut input = bytes.as_slice();
        let signature = Self::decode(&mut input)?;
        if !input.is_empty() {
            return Err(Error::invalid_argument(format!(
                "{} trailing bytes after signature",
                input.len()
            )));
        }
        Ok(signature)
    }
}

// ============================================================================
// SignedExtrinsic
// ============================================================================

/// A signed, length-prefixed extrinsic ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedExtrinsic(Vec<u8>);

impl SignedExtrinsic {
    /// Assembles the extrinsic from its parts.
    #[must_use]
    pub fn new(
        signer: &[u8; 32],
        signature: &MultiSignature,
        call: &Call,
        params: &ExtrinsicParams,
    ) -> Self {
        let mut body = vec![SIGNED_EXTRINSIC_V4, MULTI_ADDRESS_ID];
        body.extend_from_slice(signer);
        signature.encode_to(&mut body);
        body.extend(params.extra());
        body.extend_from_slice(call.as_bytes());

        let mut bytes = Compact(body.len() as u32).encode();
        bytes.extend(body);
        Self(bytes)
    }

    /// Encoded bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Encoded bytes as hex.
    #[inline]
    #[must_use]
    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }

    /// Blake2-256 hash of the encoded extrinsic, as hex.
    #[must_use]
    pub fn hash(&self) -> String {
        to_hex(blake2_256(&self.0))
    }
}

// ============================================================================
// Tests
// ============================================================================
