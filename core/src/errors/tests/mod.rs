mod verification_error_tests;
