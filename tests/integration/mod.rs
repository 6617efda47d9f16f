mod sqlite_sink_integration;
