mod byte_preservation;
