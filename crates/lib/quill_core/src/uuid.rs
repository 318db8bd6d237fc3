// Helper for generating UUIDv7 (timestamp-sortable UUIDs).
//
// All Quill tables use app-side UUIDv7 keys so that both storage backends
// hand out the same kind of identifier and rows sort by creation time.

use uuid::Uuid;

/// Generate a new UUIDv7 (timestamp-sortable).
pub fn uuidv7() -> Uuid {
    Uuid::now_v7()
}

/// Parse a path or claim segment into a UUID, returning `None` on garbage.
pub fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}
