//! Option overrides that hold for one top-level call.

use core::ops::{Deref, DerefMut};

use bindery_stream::{JsonReader, JsonWriter, WriterOptions};

/// Applies writer options for its lifetime and restores the previous ones on drop.
pub struct WriterOptionsGuard<'g, 'w> {
    writer: &'g mut JsonWriter<'w>,
    saved: WriterOptions,
}

impl<'g, 'w> WriterOptionsGuard<'g, 'w> {
    /// Save `writer`'s options and apply `options`.
    pub fn new(writer: &'g mut JsonWriter<'w>, options: WriterOptions) -> Self {
        let saved = writer.options();
        writer.set_options(options);
        Self { writer, saved }
    }
}

impl<'w> Deref for WriterOptionsGuard<'_, 'w> {
    type Target = JsonWriter<'w>;

    fn deref(&self) -> &Self::Target {
        self.writer
    }
}

impl DerefMut for WriterOptionsGuard<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.writer
    }
}

impl Drop for WriterOptionsGuard<'_, '_> {
    fn drop(&mut self) {
        self.writer.set_options(self.saved);
    }
}

/// Forces a reader's leniency for its lifetime and restores it on drop.
pub struct ReaderOptionsGuard<'g, 'a> {
    reader: &'g mut JsonReader<'a>,
    saved: bool,
}

impl<'g, 'a> ReaderOptionsGuard<'g, 'a> {
    /// Save `reader`'s leniency and set it to `lenient`.
    pub fn new(reader: &'g mut JsonReader<'a>, lenient: bool) -> Self {
        let saved = reader.is_lenient();
        reader.set_lenient(lenient);
        Self { reader, saved }
    }
}

impl<'a> Deref for ReaderOptionsGuard<'_, 'a> {
    type Target = JsonReader<'a>;

    fn deref(&self) -> &Self::Target {
        self.reader
    }
}

impl DerefMut for ReaderOptionsGuard<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.reader
    }
}

impl Drop for ReaderOptionsGuard<'_, '_> {
    fn drop(&mut self) {
        self.reader.set_lenient(self.saved);
    }
}
