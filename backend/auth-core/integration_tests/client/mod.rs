mod socket_client;
