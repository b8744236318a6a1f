mod client;
mod helpers;
mod server;
mod web;
