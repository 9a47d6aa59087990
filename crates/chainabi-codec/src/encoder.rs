//! Call encoder: resolves a function in an ABI and produces call payloads.
//!
//! # Usage
//! ```ignore
//! let encoder = AbiEncoder::from_abi_json(ABI_JSON)?;
//! let payload = encoder.encode_call_hex("transfer", &[
//!     AbiValue::address("0xd8da6bf26964af9d7eed9e03e53415d37aa96045")?,
//!     AbiValue::uint(1_000_000),
//! ], HexStyle::Bare)?;
//! ```

use chainabi_core::{
    abi::{ContractAbi, FunctionDescriptor},
    call::DecodedResult,
    error::{AbiError, DecodeError, EncodeError},
    hexutil::{self, HexStyle},
    signature::canonical_signature,
    types::AbiValue,
};
use serde_json::Value;

use crate::codec::encode_params;
use crate::decoder::decode_result_hex;

/// ABI-driven encoder for contract calls and deployments.
#[derive(Debug, Clone)]
pub struct AbiEncoder {
    abi: ContractAbi,
}

impl AbiEncoder {
    pub fn new(abi: ContractAbi) -> Self {
        Self { abi }
    }

    /// Create an encoder from ABI JSON (entry array or `{ "abi": [...] }`).
    pub fn from_abi_json(abi_json: &str) -> Result<Self, AbiError> {
        ContractAbi::from_json(abi_json).map(Self::new)
    }

    pub fn abi(&self) -> &ContractAbi {
        &self.abi
    }

    /// Resolve the overload of `method` that accepts `args`.
    ///
    /// `method` is either a bare name or a full signature such as
    /// `transfer(address,uint256)`.
    pub fn resolve_function(&self, method: &str, args: &[AbiValue]) -> Result<&FunctionDescriptor, EncodeError> {
        self.resolve(method, args.len(), |f| encode_args(f, args))
            .map(|(f, _)| f)
    }

    /// Encode a call: `selector ++ head ++ tail`.
    ///
    /// A function without inputs encodes as its 4-byte selector alone.
    pub fn encode_call(&self, method: &str, args: &[AbiValue]) -> Result<Vec<u8>, EncodeError> {
        self.prepare_call(method, args).map(|(_, payload)| payload)
    }

    /// Resolve and encode in one step, keeping the resolved function so its
    /// outputs can decode the reply.
    pub fn prepare_call(&self, method: &str, args: &[AbiValue]) -> Result<(&FunctionDescriptor, Vec<u8>), EncodeError> {
        let (func, encoded) = self.resolve(method, args.len(), |f| encode_args(f, args))?;
        Ok((func, with_selector(func, encoded)))
    }

    /// [`Self::encode_call`] rendered as hex.
    pub fn encode_call_hex(&self, method: &str, args: &[AbiValue], style: HexStyle) -> Result<String, EncodeError> {
        self.encode_call(method, args).map(|bytes| style.encode(bytes))
    }

    /// Encode a call from JSON arguments, coercing each one to the input type
    /// of the candidate overload being tried.
    pub fn encode_call_json(&self, method: &str, args: &[Value]) -> Result<Vec<u8>, EncodeError> {
        self.prepare_call_json(method, args).map(|(_, payload)| payload)
    }

    /// JSON-argument form of [`Self::prepare_call`].
    pub fn prepare_call_json(&self, method: &str, args: &[Value]) -> Result<(&FunctionDescriptor, Vec<u8>), EncodeError> {
        let (func, encoded) = self.resolve(method, args.len(), |f| {
            let values = f
                .inputs
                .iter()
                .zip(args)
                .map(|(param, arg)| AbiValue::from_json(&param.ty, arg))
                .collect::<Result<Vec<_>, _>>()?;
            encode_args(f, &values)
        })?;
        Ok((func, with_selector(func, encoded)))
    }

    /// Deployment payload: `bytecode ++ encoded constructor arguments`.
    pub fn encode_constructor(&self, bytecode: &str, args: &[AbiValue]) -> Result<Vec<u8>, EncodeError> {
        let mut payload = hexutil::decode(bytecode).map_err(|e| EncodeError::InvalidHex {
            reason: format!("bytecode: {e}"),
        })?;

        let Some(ctor) = self.abi.constructor() else {
            if args.is_empty() {
                return Ok(payload);
            }
            return Err(EncodeError::NoConstructor);
        };

        if ctor.inputs.len() != args.len() {
            return Err(EncodeError::ArgumentCount {
                method: "constructor".into(),
                expected: ctor.inputs.len(),
                got: args.len(),
            });
        }
        payload.extend(encode_params(ctor.inputs.iter().map(|p| &p.ty).zip(args))?);
        Ok(payload)
    }

    /// Look up a function for result decoding.
    ///
    /// With a bare name, the first declaration in ABI order is used.
    pub fn function(&self, method: &str) -> Result<&FunctionDescriptor, DecodeError> {
        self.candidates(method)
            .into_iter()
            .next()
            .ok_or_else(|| DecodeError::FunctionNotFound { name: method.into() })
    }

    /// Decode the hex return blob of `method` into its named outputs.
    pub fn decode_call_result(&self, method: &str, hex_str: &str) -> Result<DecodedResult, DecodeError> {
        let func = self.function(method)?;
        decode_result_hex(&func.outputs, hex_str)
    }

    fn candidates(&self, method: &str) -> Vec<&FunctionDescriptor> {
        if !method.contains('(') {
            return self.abi.functions_named(method.trim()).collect();
        }
        // A malformed signature matches nothing.
        match canonical_signature(method) {
            Ok(signature) => self.abi.functions().filter(|f| f.signature() == signature).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Filter overloads by argument count, then by whether `prepare`
    /// accepts them. Exactly one overload must remain.
    fn resolve<T>(
        &self,
        method: &str,
        arg_count: usize,
        mut prepare: impl FnMut(&FunctionDescriptor) -> Result<T, EncodeError>,
    ) -> Result<(&FunctionDescriptor, T), EncodeError> {
        let candidates = self.candidates(method);
        let Some(first) = candidates.first() else {
            return Err(EncodeError::FunctionNotFound { name: method.into() });
        };

        let by_count: Vec<&FunctionDescriptor> = candidates
            .iter()
            .copied()
            .filter(|f| f.inputs.len() == arg_count)
            .collect();
        if by_count.is_empty() {
            return Err(EncodeError::ArgumentCount {
                method: method.into(),
                expected: first.inputs.len(),
                got: arg_count,
            });
        }

        let mut accepted = Vec::new();
        let mut last_err = None;
        for func in &by_count {
            match prepare(func) {
                Ok(prepared) => accepted.push((*func, prepared)),
                Err(e) => last_err = Some(e),
            }
        }

        if accepted.len() > 1 {
            return Err(EncodeError::AmbiguousSignature {
                name: method.into(),
                candidates: accepted.iter().map(|(f, _)| f.signature()).collect(),
            });
        }
        match (accepted.pop(), last_err) {
            (Some(found), _) => {
                tracing::trace!(method, signature = %found.0.signature(), "resolved function");
                Ok(found)
            }
            (None, Some(err)) if by_count.len() == 1 => Err(err),
            (None, _) => Err(EncodeError::TypeMismatch {
                ty: by_count.iter().map(|f| f.signature()).collect::<Vec<_>>().join(" | "),
                reason: "no overload accepts the given arguments".into(),
            }),
        }
    }
}

fn encode_args(func: &FunctionDescriptor, args: &[AbiValue]) -> Result<Vec<u8>, EncodeError> {
    encode_params(func.inputs.iter().map(|p| &p.ty).zip(args))
}

fn with_selector(func: &FunctionDescriptor, encoded: Vec<u8>) -> Vec<u8> {
    let mut payload = Vec::with_capacity(4 + encoded.len());
    payload.extend_from_slice(&func.selector());
    payload.extend(encoded);
    payload
}
