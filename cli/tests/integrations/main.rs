mod fixtures;
mod run;
mod server;
