mod flush;
mod session;
