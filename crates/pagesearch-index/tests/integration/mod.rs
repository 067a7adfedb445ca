mod lifecycle;
mod reindex;
