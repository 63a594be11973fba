/// Data layer: core types and loading.
///
/// Architecture:
/// ```text
///  .rad header + .rd3 body
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse header, decode i16 traces
///   └──────────┘
///        │
///        ▼
///   ┌────────────────────────┐
///   │ Profile + ProfileMetadata│  Vec<Trace>, scalar survey description
///   └────────────────────────┘
///        │
///        ▼
///   processing (dewow → smooth → locate)
/// ```

pub mod loader;
pub mod model;
