mod concurrency;
mod playback;
