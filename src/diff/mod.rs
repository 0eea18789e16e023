//! Diff input: Gerrit wire types and unified patch parsing

mod parse;
mod wire;

pub use parse::{ParsedPatch, PatchHunk, PatchLine};
pub use wire::{
    parse_diff_info, strip_xssi_prefix, DiffContent, DiffHunk, DiffInfo, FileDiff, FileMeta,
    IntralineEdit, XSSI_PREFIX,
};
