mod update_filter_test;
