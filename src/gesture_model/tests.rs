mod play_loop_test;
