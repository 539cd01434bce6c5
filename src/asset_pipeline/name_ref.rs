use bytemuck::{Pod, Zeroable};

use crate::asset_pipeline::load_error::LoadError;

/// Half-open byte range into a flat `str0` name table.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct NameRef {
    pub begin: u32,
    pub end: u32,
}

const _: () = assert!(std::mem::size_of::<NameRef>() == 8);

impl NameRef {
    pub fn resolve<'a>(&self, names: &'a [u8]) -> Result<&'a str, LoadError> {
        if self.begin > self.end || self.end as usize > names.len() {
            return Err(LoadError::NameOutOfRange {
                begin: self.begin,
                end: self.end,
                len: names.len(),
            });
        }

        std::str::from_utf8(&names[self.begin as usize..self.end as usize]).map_err(|_| {
            LoadError::InvalidUtf8 {
                begin: self.begin,
                end: self.end,
            }
        })
    }
}
