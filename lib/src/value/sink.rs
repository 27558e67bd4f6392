use std::{fs, io};
use std::path::{Path, PathBuf};
use std::fmt::Debug;

use crate::error::{Result, Chainable};
use crate::value::Value;

pub trait Sink: Debug {
    fn write<V: Into<Value> + 'static>(&self, value: V) -> Result<()> {
        self.write_value(value.into())
    }

    fn write_value(&self, value: Value) -> Result<()>;
}

impl Sink for fs::File {
    fn write_value(&self, value: Value) -> Result<()> {
        #[inline(always)]
        fn write_bytes(to: &mut dyn io::Write, bytes: &[u8]) -> Result<()> {
            Ok(to.write_all(bytes)?)
        }

        fn write_value(to: &mut dyn io::Write, value: &Value) -> Result<()> {
            match value {
                Value::Null => Ok(()),
                Value::Bool(b) => write_bytes(to, &[*b as u8]),
                Value::String(s) => write_bytes(to, s.as_bytes()),
                Value::Array(array) => array.iter().try_for_each(|v| write_value(to, v)),
                Value::Num(n) => match n.to_u128_strict() {
                    Some(Ok(v)) => match u8::try_from(v) {
                        Ok(byte) => write_bytes(to, &[byte]),
                        Err(_) => write_bytes(to, &v.to_le_bytes()[..]),
                    },
                    Some(Err(v)) => write_bytes(to, &v.to_le_bytes()[..]),
                    None => write_bytes(to, n.to_f64().to_string().as_bytes()),
                },
                Value::Dict(_) => Err("file endpoint does not support dictionary writes".into()),
            }
        }

        let mut file = io::BufWriter::new(self);
        write_value(&mut file, &value)?;
        io::Write::flush(&mut file)?;
        Ok(())
    }
}

impl Sink for &Path {
    fn write_value(&self, value: Value) -> Result<()> {
        if let Some(parent) = self.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).chain_with(|| error! {
                [OutputWrite] "failed to create output directory",
                "directory" => parent.display()
            })?;
        }

        fs::File::create(self)
            .chain_with(|| error! {
                [OutputWrite] "failed to open/create file for writing",
                "file path" => self.display()
            })?
            .write(value)
            .chain_with(|| error! {
                [OutputWrite] "failed to write file",
                "file path" => self.display()
            })
    }
}

impl Sink for PathBuf {
    fn write_value(&self, value: Value) -> Result<()> {
        <&Path as Sink>::write_value(&self.as_path(), value)
    }
}

impl<T: Sink> Sink for &T {
    fn write_value(&self, value: Value) -> Result<()> {
        <T as Sink>::write_value(self, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_sink_creates_parents_and_writes_text() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested/deeper/page.html");
        output.write("<p>hello</p>").unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), "<p>hello</p>");
    }

    #[test]
    fn byte_values_are_written_raw() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.bin");
        let bytes = vec![0u8, 159, 146, 150, 255];

        output.write(bytes.clone()).unwrap();
        assert_eq!(fs::read(&output).unwrap(), bytes);
    }
}
