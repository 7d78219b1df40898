/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Reversible byte transforms: compression and encryption.

use crate::error::{CompileError, TransformError};
use crate::registration::EncryptionDetails;
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD, Engine};
use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression as Level;
use sha1::{Digest, Sha1};
use std::io::{Read, Write};
use std::str::FromStr;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

const AES_BLOCK_SIZE: usize = 16;

/// Deterministic byte transform. `revert` undoes `transform` for the same configuration.
pub trait Transformer: Send + Sync {
    fn transform(&self, data: &[u8]) -> Result<Vec<u8>, TransformError>;

    fn revert(&self, data: &[u8]) -> Result<Vec<u8>, TransformError>;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Compression {
    None,
    Gzip,
    Zlib,
}

impl FromStr for Compression {
    type Err = CompileError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "" | "NONE" => Ok(Compression::None),
            "GZIP" => Ok(Compression::Gzip),
            "ZIP" => Ok(Compression::Zlib),
            other => Err(CompileError::unsupported("compression", other)),
        }
    }
}

impl Compression {
    pub fn transformer(self) -> Option<Box<dyn Transformer>> {
        match self {
            Compression::None => None,
            Compression::Gzip => Some(Box::new(GzipTransformer)),
            Compression::Zlib => Some(Box::new(ZlibTransformer)),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Encryption {
    None,
    Aes,
}

impl FromStr for Encryption {
    type Err = CompileError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "" | "NONE" => Ok(Encryption::None),
            "AES" => Ok(Encryption::Aes),
            other => Err(CompileError::unsupported(
                "encryption.encryptionAlgorithm",
                other,
            )),
        }
    }
}

impl Encryption {
    pub fn transformer(
        self,
        details: &EncryptionDetails,
    ) -> Result<Option<Box<dyn Transformer>>, CompileError> {
        match self {
            Encryption::None => Ok(None),
            Encryption::Aes => Ok(Some(Box::new(AesTransformer::new(details)?))),
        }
    }
}

/// gzip with a zeroed header timestamp so equal input gives equal output.
pub struct GzipTransformer;

impl Transformer for GzipTransformer {
    fn transform(&self, data: &[u8]) -> Result<Vec<u8>, TransformError> {
        let mut encoder = GzEncoder::new(Vec::new(), Level::default());
        encoder.write_all(data)?;
        Ok(encoder.finish()?)
    }

    fn revert(&self, data: &[u8]) -> Result<Vec<u8>, TransformError> {
        let mut decoded = Vec::new();
        GzDecoder::new(data).read_to_end(&mut decoded)?;
        Ok(decoded)
    }
}

pub struct ZlibTransformer;

impl Transformer for ZlibTransformer {
    fn transform(&self, data: &[u8]) -> Result<Vec<u8>, TransformError> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Level::default());
        encoder.write_all(data)?;
        Ok(encoder.finish()?)
    }

    fn revert(&self, data: &[u8]) -> Result<Vec<u8>, TransformError> {
        let mut decoded = Vec::new();
        ZlibDecoder::new(data).read_to_end(&mut decoded)?;
        Ok(decoded)
    }
}

/// AES-128-CBC, PKCS#7 padded, base64 encoded.
///
/// The cipher key is the first 16 bytes of SHA-1 over the configured key string; the IV
/// is the configured vector's bytes, zero-padded or truncated to one block.
pub struct AesTransformer {
    key: [u8; AES_BLOCK_SIZE],
    iv: [u8; AES_BLOCK_SIZE],
}

impl AesTransformer {
    pub fn new(details: &EncryptionDetails) -> Result<Self, CompileError> {
        if details.key.is_empty() {
            return Err(CompileError::Invalid {
                field: "encryption.encryptionKey",
                reason: "AES requires a key".to_string(),
            });
        }

        let digest = Sha1::digest(details.key.as_bytes());
        let mut key = [0u8; AES_BLOCK_SIZE];
        key.copy_from_slice(&digest[..AES_BLOCK_SIZE]);

        let mut iv = [0u8; AES_BLOCK_SIZE];
        let vector = details.init_vector.as_bytes();
        let len = vector.len().min(AES_BLOCK_SIZE);
        iv[..len].copy_from_slice(&vector[..len]);

        Ok(Self { key, iv })
    }
}

impl Transformer for AesTransformer {
    fn transform(&self, data: &[u8]) -> Result<Vec<u8>, TransformError> {
        let ciphertext = Aes128CbcEnc::new(&self.key.into(), &self.iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(data);
        Ok(STANDARD.encode(ciphertext).into_bytes())
    }

    fn revert(&self, data: &[u8]) -> Result<Vec<u8>, TransformError> {
        let ciphertext = STANDARD.decode(data)?;
        Aes128CbcDec::new(&self.key.into(), &self.iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|err| TransformError::Cipher(err.to_string()))
    }
}
