//! Proof payload decoding.
//!
//! The DA layer returns the attestation response as ABI-encoded bytes. The
//! component to decode against is taken from the verification interface's
//! ABI: the second component of the first fragment's first input (the
//! `data` struct next to the Merkle proof).

use ethers::abi::{self, Param, ParamType, Token};
use ethers::types::I256;
use serde::Serialize;
use serde_json::Value;

use crate::da_layer::RawProof;
use crate::error::FdcError;

/// ABI of the JSON-API verification interface.
pub const JSON_API_VERIFICATION_ABI: &str = r#"[
  {
    "inputs": [
      {
        "components": [
          { "internalType": "bytes32[]", "name": "merkleProof", "type": "bytes32[]" },
          {
            "components": [
              { "internalType": "bytes32", "name": "attestationType", "type": "bytes32" },
              { "internalType": "bytes32", "name": "sourceId", "type": "bytes32" },
              { "internalType": "uint64", "name": "votingRound", "type": "uint64" },
              { "internalType": "uint64", "name": "lowestUsedTimestamp", "type": "uint64" },
              {
                "components": [
                  { "internalType": "string", "name": "url", "type": "string" },
                  { "internalType": "string", "name": "postprocessJq", "type": "string" },
                  { "internalType": "string", "name": "abiSignature", "type": "string" }
                ],
                "internalType": "struct IJsonApi.RequestBody",
                "name": "requestBody",
                "type": "tuple"
              },
              {
                "components": [
                  { "internalType": "bytes", "name": "abiEncodedData", "type": "bytes" }
                ],
                "internalType": "struct IJsonApi.ResponseBody",
                "name": "responseBody",
                "type": "tuple"
              }
            ],
            "internalType": "struct IJsonApi.Response",
            "name": "data",
            "type": "tuple"
          }
        ],
        "internalType": "struct IJsonApi.Proof",
        "name": "_proof",
        "type": "tuple"
      }
    ],
    "name": "verifyJsonApi",
    "outputs": [
      { "internalType": "bool", "name": "_proved", "type": "bool" }
    ],
    "stateMutability": "pure",
    "type": "function"
  }
]"#;

/// Immutable ABI schema for decoding attestation response payloads.
///
/// Built once and passed into the pipeline; no module-level interface
/// state.
#[derive(Clone, Debug)]
pub struct ProofSchema {
    component: ParamType,
}

impl ProofSchema {
    /// Schema over an explicit ABI component.
    pub fn new(component: ParamType) -> Self {
        Self { component }
    }

    /// Schema for the JSON-API attestation response.
    pub fn json_api() -> Self {
        Self::from_verification_abi(JSON_API_VERIFICATION_ABI)
            .expect("embedded JSON-API verification ABI is well-formed")
    }

    /// Extract the response component from a verification-interface ABI:
    /// the second component of the first fragment's first input.
    pub fn from_verification_abi(abi_json: &str) -> Result<Self, FdcError> {
        let fragments: Value = serde_json::from_str(abi_json)
            .map_err(|e| FdcError::SchemaMismatch(format!("invalid ABI JSON: {e}")))?;
        let component = fragments
            .get(0)
            .and_then(|fragment| fragment.get("inputs"))
            .and_then(|inputs| inputs.get(0))
            .and_then(|input| input.get("components"))
            .and_then(|components| components.get(1))
            .ok_or_else(|| {
                FdcError::SchemaMismatch(
                    "verification ABI has no response component at fragment 0, input 0".into(),
                )
            })?;
        let param: Param = serde_json::from_value(component.clone())
            .map_err(|e| FdcError::SchemaMismatch(format!("malformed response component: {e}")))?;
        Ok(Self { component: param.kind })
    }

    pub fn component(&self) -> &ParamType {
        &self.component
    }
}

/// Final artifact returned to callers: Merkle path plus decoded data.
#[derive(Clone, Debug, Serialize)]
pub struct DecodedProof {
    pub merkle_proof: Vec<String>,
    pub data: Value,
}

/// Decode a raw proof payload against a schema.
///
/// Integer leaves become decimal strings; the payload may carry values
/// wider than any native JSON number.
pub fn decode_proof(raw: &RawProof, schema: &ProofSchema) -> Result<DecodedProof, FdcError> {
    let payload = raw.response_hex.strip_prefix("0x").unwrap_or(&raw.response_hex);
    let bytes = hex::decode(payload)
        .map_err(|e| FdcError::DecodeError(format!("response_hex is not valid hex: {e}")))?;
    let tokens = abi::decode(&[schema.component().clone()], &bytes)
        .map_err(|e| FdcError::DecodeError(format!("payload does not match schema: {e}")))?;
    let token = tokens
        .into_iter()
        .next()
        .ok_or_else(|| FdcError::DecodeError("empty decoding result".into()))?;

    Ok(DecodedProof {
        merkle_proof: raw.proof.clone(),
        data: token_to_json(token),
    })
}

fn token_to_json(token: Token) -> Value {
    match token {
        Token::Address(address) => Value::String(format!("{address:?}")),
        Token::FixedBytes(bytes) | Token::Bytes(bytes) => {
            Value::String(format!("0x{}", hex::encode(bytes)))
        }
        Token::Uint(value) => Value::String(value.to_string()),
        Token::Int(value) => Value::String(I256::from_raw(value).to_string()),
        Token::Bool(value) => Value::Bool(value),
        Token::String(value) => Value::String(value),
        Token::Array(tokens) | Token::FixedArray(tokens) | Token::Tuple(tokens) => {
            Value::Array(tokens.into_iter().map(token_to_json).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use ethers::types::U256;
    use serde_json::json;

    use super::*;

    fn response_tokens(voting_round: u64, timestamp: U256) -> Token {
        Token::Tuple(vec![
            Token::FixedBytes(vec![0x11; 32]),
            Token::FixedBytes(vec![0x22; 32]),
            Token::Uint(U256::from(voting_round)),
            Token::Uint(timestamp),
            Token::Tuple(vec![
                Token::String("https://api.example.org/price".into()),
                Token::String(".data.value".into()),
                Token::String("uint256".into()),
            ]),
            Token::Tuple(vec![Token::Bytes(vec![0xde, 0xad, 0xbe, 0xef])]),
        ])
    }

    fn raw_proof_for(token: Token) -> RawProof {
        RawProof {
            response_hex: format!("0x{}", hex::encode(abi::encode(&[token]))),
            proof: vec!["0xaa".into(), "0xbb".into()],
        }
    }

    #[test]
    fn test_json_api_schema_shape() {
        let schema = ProofSchema::json_api();
        match schema.component() {
            ParamType::Tuple(fields) => assert_eq!(fields.len(), 6),
            other => panic!("expected tuple component, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_roundtrip_preserves_wide_integers() {
        // 2^60, far above what a JSON number can carry losslessly
        let wide = U256::from(1u64 << 60);
        let raw = raw_proof_for(response_tokens(812, wide));
        let decoded = decode_proof(&raw, &ProofSchema::json_api()).unwrap();

        assert_eq!(decoded.merkle_proof, vec!["0xaa", "0xbb"]);
        assert_eq!(
            decoded.data,
            json!([
                format!("0x{}", "11".repeat(32)),
                format!("0x{}", "22".repeat(32)),
                "812",
                "1152921504606846976",
                ["https://api.example.org/price", ".data.value", "uint256"],
                ["0xdeadbeef"],
            ])
        );
    }

    #[test]
    fn test_decode_rejects_bad_hex() {
        let raw = RawProof {
            response_hex: "0xzz".into(),
            proof: vec![],
        };
        assert!(matches!(
            decode_proof(&raw, &ProofSchema::json_api()),
            Err(FdcError::DecodeError(_))
        ));
    }

    #[test]
    fn test_decode_rejects_mismatched_layout() {
        let raw = RawProof {
            response_hex: "0x1234".into(),
            proof: vec![],
        };
        assert!(matches!(
            decode_proof(&raw, &ProofSchema::json_api()),
            Err(FdcError::DecodeError(_))
        ));
    }

    #[test]
    fn test_schema_rejects_invalid_json() {
        assert!(matches!(
            ProofSchema::from_verification_abi("not json"),
            Err(FdcError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_schema_rejects_wrong_shape() {
        let abi_json = r#"[{ "inputs": [], "name": "noop", "type": "function" }]"#;
        assert!(matches!(
            ProofSchema::from_verification_abi(abi_json),
            Err(FdcError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_int_tokens_render_signed() {
        let schema = ProofSchema::new(ParamType::Int(256));
        let negative = I256::from(-42).into_raw();
        let raw = RawProof {
            response_hex: format!("0x{}", hex::encode(abi::encode(&[Token::Int(negative)]))),
            proof: vec![],
        };
        let decoded = decode_proof(&raw, &schema).unwrap();
        assert_eq!(decoded.data, json!("-42"));
    }
}
