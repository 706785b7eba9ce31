use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("header block is truncated")]
    Truncated,
    #[error("color table has {0} entries, an IGDS table holds at most 256")]
    OversizedColorTable(usize),
}
