mod gate;
mod routes;
