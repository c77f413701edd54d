use std::io::{Read, Write};

use serde::de::{Deserialize, DeserializeOwned};
use serde::Serialize;

use crate::Result;

/// CBOR-decode a value from a reader.
pub trait CborRead: Sized {
    fn from_cbor_read<R>(read: R) -> Result<Self>
    where
        R: Read;
}

/// CBOR-encode a value to a writer.
pub trait CborWrite {
    fn to_cbor_write<W>(&self, write: &mut W) -> Result<()>
    where
        W: Write;
}

impl<T> CborRead for T
where
    T: DeserializeOwned,
{
    fn from_cbor_read<R>(read: R) -> Result<Self>
    where
        R: Read,
    {
        Ok(serde_cbor::from_reader(read)?)
    }
}

impl<T> CborWrite for T
where
    T: Serialize,
{
    fn to_cbor_write<W>(&self, write: &mut W) -> Result<()>
    where
        W: Write,
    {
        serde_cbor::to_writer(write, self)?;
        Ok(())
    }
}

/// Write a model artifact: the model followed by the feature-generator
/// configuration, as two sequentially encoded objects.
pub fn write_model_artifact<M, G, W>(write: &mut W, model: &M, generator: &G) -> Result<()>
where
    M: Serialize,
    G: Serialize,
    W: Write,
{
    serde_cbor::to_writer(&mut *write, model)?;
    serde_cbor::to_writer(write, generator)?;
    Ok(())
}

/// Read back a model artifact in the order it was written.
pub fn read_model_artifact<M, G, R>(read: R) -> Result<(M, G)>
where
    M: DeserializeOwned,
    G: DeserializeOwned,
    R: Read,
{
    let mut deserializer = serde_cbor::Deserializer::from_reader(read);
    let model = M::deserialize(&mut deserializer)?;
    let generator = G::deserialize(&mut deserializer)?;
    Ok((model, generator))
}
