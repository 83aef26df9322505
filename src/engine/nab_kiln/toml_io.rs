use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::io::{Read, Write};
use std::path::Path;

pub trait TomlRead: DeserializeOwned
{
    fn load(reader: &mut impl Read) -> Result<Self, Box<dyn Error + Send + Sync>>
    {
        let mut buf = String::new();
        reader.read_to_string(&mut buf)?;
        Self::from_toml_str(&buf)
    }

    fn from_toml_str(text: &str) -> Result<Self, Box<dyn Error + Send + Sync>>
    {
        Ok(toml::from_str(text)?)
    }

    fn load_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error + Send + Sync>>
    {
        let mut file = std::fs::File::open(path.as_ref())
            .map_err(|e| format!("Failed to open '{}': {e}", path.as_ref().display()))?;
        Self::load(&mut file)
    }
}

pub trait TomlWrite: Serialize
{
    fn save(&self, prettify: bool, writer: &mut impl Write) -> Result<(), Box<dyn Error + Send + Sync>>
    {
        writer.write_all(self.to_toml_string(prettify)?.as_bytes())?;
        Ok(())
    }

    fn to_toml_string(&self, prettify: bool) -> Result<String, Box<dyn Error + Send + Sync>>
    {
        Ok(match prettify
        {
            true => toml::ser::to_string_pretty(self)?,
            false => toml::ser::to_string(self)?,
        })
    }
}
