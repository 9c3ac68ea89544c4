mod team_handlers_test;
